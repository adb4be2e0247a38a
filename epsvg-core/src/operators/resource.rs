//! Named resources: `defineresource` and friends over the
//! [`ResourceManager`](crate::resources::ResourceManager) categories.

use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::interpreter::Interpreter;
use crate::operators::control::start_forall;
use crate::resources::matches_template;
use crate::types::Value;

fn pop_category(interp: &mut Interpreter) -> InterpResult<String> {
    let v = interp.pop()?;
    Ok(v.to_name()?.text().into_owned())
}

fn undefined_resource(interp: &Interpreter, key: &Value, category: &str) -> InterpreterError {
    let key = String::from_utf8_lossy(&interp.text_of(key)).into_owned();
    InterpreterError::new(
        ErrorKind::UndefinedResource,
        format!("no {category} resource {key}"),
    )
}

/// `key instance category defineresource instance`.
pub(super) fn defineresource(interp: &mut Interpreter) -> InterpResult<()> {
    let category = pop_category(interp)?;
    let instance = interp.pop()?;
    let key = interp.pop()?;
    let resources = interp.resources;
    let stored = resources.define(&mut interp.vm, &category, &key, instance)?;
    interp.push(stored);
    Ok(())
}

/// `key category findresource instance`. Fonts not yet defined are
/// synthesized like `findfont` does.
pub(super) fn findresource(interp: &mut Interpreter) -> InterpResult<()> {
    let category = pop_category(interp)?;
    let key = interp.pop()?;
    if category == "Font" {
        let font = super::font::find_font(interp, &key)?;
        interp.push(font);
        return Ok(());
    }
    let resources = interp.resources;
    let found = resources.find(&mut interp.vm, &category, &key)?;
    let instance = found.ok_or_else(|| undefined_resource(interp, &key, &category))?;
    interp.push(instance);
    Ok(())
}

/// `key findencoding array`: `key /Encoding findresource`.
pub(super) fn findencoding(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let resources = interp.resources;
    let found = resources.find(&mut interp.vm, "Encoding", &key)?;
    let encoding = found.ok_or_else(|| undefined_resource(interp, &key, "Encoding"))?;
    interp.push(encoding);
    Ok(())
}

/// `key category resourcestatus status size true` or `false`.
pub(super) fn resourcestatus(interp: &mut Interpreter) -> InterpResult<()> {
    let category = pop_category(interp)?;
    let key = interp.pop()?;
    let resources = interp.resources;
    if resources.find(&mut interp.vm, &category, &key)?.is_some() {
        // Defined in VM; the size is unknown.
        interp.push(Value::int(0));
        interp.push(Value::int(-1));
        interp.push(Value::boolean(true));
    } else {
        interp.push(Value::boolean(false));
    }
    Ok(())
}

pub(super) fn undefineresource(interp: &mut Interpreter) -> InterpResult<()> {
    let category = pop_category(interp)?;
    let key = interp.pop()?;
    let resources = interp.resources;
    resources.undefine(&mut interp.vm, &category, &key)
}

/// `template proc scratch category resourceforall`. Each matching key is
/// handed to `proc` as a new string.
pub(super) fn resourceforall(interp: &mut Interpreter) -> InterpResult<()> {
    let category = pop_category(interp)?;
    interp.pop_string()?;
    let proc = interp.pop_proc()?;
    let template = interp.pop_bytes()?;
    let resources = interp.resources;
    let keys = resources.keys(&mut interp.vm, &category)?;
    let mut items = std::collections::VecDeque::new();
    for key in &keys {
        let Ok(text) = interp.text_bytes(key) else {
            continue;
        };
        if matches_template(&template, &text) {
            items.push_back(interp.new_string_value(text)?);
        }
    }
    start_forall(interp, 1, items, proc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::interpreter::Interpreter;

    fn bools(interp: &Interpreter) -> Vec<bool> {
        interp
            .operand_stack()
            .iter()
            .map(|v| v.to_bool().unwrap_or(false))
            .collect()
    }

    #[test]
    fn define_and_find() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/P << /x 1 >> /ProcSet defineresource pop \
                 /P /ProcSet findresource /x get 1 eq \
                 /P /ProcSet resourcestatus exch pop exch pop \
                 /Q /ProcSet resourcestatus not",
            )
            .unwrap();
        assert_eq!(bools(&interp), [true, true, true]);
    }

    #[test]
    fn missing_resource_is_undefinedresource() {
        let mut interp = Interpreter::new();
        interp
            .run("{/Nope /ProcSet findresource} stopped $error /errorname get")
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(interp.text_of(&stack[stack.len() - 1]), b"undefinedresource");
    }

    #[test]
    fn findencoding_returns_the_encoding_vector() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/StandardEncoding findencoding StandardEncoding eq \
                 /ISOLatin1Encoding findencoding length 256 eq \
                 {/NoEncoding findencoding} stopped \
                 $error /errorname get /undefinedresource eq",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(stack.len(), 5);
        assert!(stack[0].to_bool().unwrap() && stack[1].to_bool().unwrap());
        assert!(stack[3].to_bool().unwrap() && stack[4].to_bool().unwrap());
    }

    #[test]
    fn resourceforall_matches_template() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/AB 1 /ProcSet defineresource pop /AC 2 /ProcSet defineresource pop \
                 /X 3 /ProcSet defineresource pop \
                 0 (A*) {pop 1 add} 10 string /ProcSet resourceforall",
            )
            .unwrap();
        assert_eq!(interp.operand_stack()[0].to_int().unwrap(), 2);
    }

    #[test]
    fn encodings_are_resources() {
        let mut interp = Interpreter::new();
        interp
            .run("/StandardEncoding /Encoding findresource StandardEncoding eq")
            .unwrap();
        assert_eq!(bools(&interp), [true]);
    }
}
