//! Named resources: `defineresource`, `findresource` and friends.
//!
//! Every category is a dictionary in global VM, collected in one
//! `Category` dictionary. Standard categories are created the first time
//! they are used. The `Font` category is `FontDirectory` itself, so
//! `definefont` and `defineresource` see the same fonts.

use crate::dict::DictKey;
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::types::{Access, DictRef, Object, Value};
use crate::vm::Vm;

/// Categories that exist implicitly.
const STANDARD_CATEGORIES: &[&str] = &[
    "Font",
    "CIDFont",
    "CMap",
    "FontSet",
    "Encoding",
    "Form",
    "Pattern",
    "ProcSet",
    "ColorSpace",
    "Halftone",
    "ColorRendering",
    "IdiomSet",
    "InkParams",
    "TrapParams",
    "OutputDevice",
    "ControlLanguage",
    "Localization",
    "PDL",
    "HWOptions",
    "Filter",
    "ColorSpaceFamily",
    "Emulator",
    "IODevice",
    "ColorRenderingType",
    "FMapType",
    "FontType",
    "FormType",
    "HalftoneType",
    "ImageType",
    "PatternType",
    "FunctionType",
    "ShadingType",
    "TrappingType",
    "Generic",
];

/// Match `name` against a `resourceforall` template (`*` any run, `?` any
/// byte, `\` escapes).
#[must_use]
pub fn matches_template(template: &[u8], name: &[u8]) -> bool {
    match template.split_first() {
        None => name.is_empty(),
        Some((b'*', rest)) => (0..=name.len()).any(|i| matches_template(rest, &name[i..])),
        Some((b'?', rest)) => !name.is_empty() && matches_template(rest, &name[1..]),
        Some((b'\\', rest)) if !rest.is_empty() => {
            name.first() == Some(&rest[0]) && matches_template(&rest[1..], &name[1..])
        }
        Some((c, rest)) => name.first() == Some(c) && matches_template(rest, &name[1..]),
    }
}

fn undefined_category(name: &str) -> InterpreterError {
    InterpreterError::new(
        ErrorKind::Undefined,
        format!("unknown resource category /{name}"),
    )
}

/// The resource directory.
#[derive(Debug, Clone, Copy)]
pub struct ResourceManager {
    categories: DictRef,
}

impl ResourceManager {
    /// Create the category directory in global VM with `Font` backed by
    /// `font_directory`.
    pub fn new(vm: &mut Vm, font_directory: DictRef) -> InterpResult<Self> {
        let was_global = vm.is_global();
        vm.set_global(true);
        let categories = vm.new_dict(STANDARD_CATEGORIES.len());
        vm.set_global(was_global);
        let manager = Self {
            categories: categories?,
        };
        vm.dict_mut(manager.categories)?
            .insert_name("Font", Value::literal(Object::Dict(font_directory)));
        Ok(manager)
    }

    /// The instance dictionary of a category, created on first use for the
    /// standard ones.
    pub fn category(&self, vm: &mut Vm, name: &str) -> InterpResult<DictRef> {
        if name == "Category" {
            return Ok(self.categories);
        }
        if let Some(v) = vm.dict(self.categories)?.get_name(name) {
            return v.to_dict();
        }
        if !STANDARD_CATEGORIES.contains(&name) {
            return Err(undefined_category(name));
        }
        let was_global = vm.is_global();
        vm.set_global(true);
        let dict = vm.new_dict(16);
        vm.set_global(was_global);
        let dict = dict?;
        vm.dict_mut(self.categories)?
            .insert_name(name, Value::literal(Object::Dict(dict)));
        Ok(dict)
    }

    /// `defineresource`. Dictionary instances become read-only. Returns
    /// the stored instance.
    pub fn define(
        &self,
        vm: &mut Vm,
        category: &str,
        key: &Value,
        instance: Value,
    ) -> InterpResult<Value> {
        let dict = self.category(vm, category)?;
        let k = DictKey::from_value(key, vm)?;
        if let Object::Dict(d) = instance.object {
            let body = vm.dict_mut(d)?;
            body.access = body.access.restrict(Access::READ_ONLY);
        }
        tracing::debug!(category, key = ?k, "resource defined");
        vm.dict_mut(dict)?.insert(k, key.clone(), instance.clone());
        Ok(instance)
    }

    /// `findresource` without any fallback: `None` if undefined.
    pub fn find(&self, vm: &mut Vm, category: &str, key: &Value) -> InterpResult<Option<Value>> {
        let dict = self.category(vm, category)?;
        let k = DictKey::from_value(key, vm)?;
        Ok(vm.dict(dict)?.get(&k).cloned())
    }

    /// `undefineresource`. Undefining a missing instance is not an error.
    pub fn undefine(&self, vm: &mut Vm, category: &str, key: &Value) -> InterpResult<()> {
        let dict = self.category(vm, category)?;
        let k = DictKey::from_value(key, vm)?;
        vm.dict_mut(dict)?.remove(&k);
        Ok(())
    }

    /// Keys of every instance in a category.
    pub fn keys(&self, vm: &mut Vm, category: &str) -> InterpResult<Vec<Value>> {
        let dict = self.category(vm, category)?;
        Ok(vm.dict(dict)?.iter().map(|(k, _)| k.clone()).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Vm, ResourceManager, DictRef) {
        let mut vm = Vm::new(1000);
        let fonts = vm.new_dict(8).unwrap();
        let rm = ResourceManager::new(&mut vm, fonts).unwrap();
        (vm, rm, fonts)
    }

    #[test]
    fn templates() {
        assert!(matches_template(b"*", b"Times-Roman"));
        assert!(matches_template(b"Times-*", b"Times-Roman"));
        assert!(!matches_template(b"Times-*", b"Helvetica"));
        assert!(matches_template(b"?a*", b"Bar"));
        assert!(matches_template(b"a\\*", b"a*"));
        assert!(!matches_template(b"a\\*", b"ab"));
    }

    #[test]
    fn font_category_is_font_directory() {
        let (mut vm, rm, fonts) = setup();
        assert_eq!(rm.category(&mut vm, "Font").unwrap(), fonts);
    }

    #[test]
    fn define_find_undefine() {
        let (mut vm, rm, _) = setup();
        let key = Value::name("MyProcs");
        let inst = Value::literal(Object::Dict(vm.new_dict(1).unwrap()));
        rm.define(&mut vm, "ProcSet", &key, inst).unwrap();
        let found = rm.find(&mut vm, "ProcSet", &key).unwrap().unwrap();
        let d = found.to_dict().unwrap();
        assert!(!vm.dict(d).unwrap().access.can_write());
        assert_eq!(rm.keys(&mut vm, "ProcSet").unwrap().len(), 1);
        rm.undefine(&mut vm, "ProcSet", &key).unwrap();
        assert!(rm.find(&mut vm, "ProcSet", &key).unwrap().is_none());
    }

    #[test]
    fn standard_categories_are_global() {
        let (mut vm, rm, _) = setup();
        let d = rm.category(&mut vm, "Encoding").unwrap();
        assert!(d.handle.global);
        assert!(!vm.is_global());
    }

    #[test]
    fn unknown_category_is_undefined() {
        let (mut vm, rm, _) = setup();
        let err = rm.category(&mut vm, "NoSuchCategory").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Undefined);
    }
}
