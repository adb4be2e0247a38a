//! Text forms of values: `cvs`/`=` and the syntactic `==` form.

use std::fmt::Write as _;

use super::Interpreter;
use crate::types::{Object, Value};

/// Nesting beyond which `==` stops descending into arrays.
const MAX_DEPTH: usize = 32;

/// Format a real the way PostScript prints it: always with a decimal point
/// or an exponent, at most six fractional digits.
#[must_use]
pub fn format_real(r: f64) -> String {
    if r.is_nan() {
        return "nan".into();
    }
    if r.is_infinite() {
        return if r > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let magnitude = r.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        let text = format!("{r:e}");
        let (mantissa, exp) = text.split_once('e').unwrap_or((&text, "0"));
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{mantissa}.0")
        };
        let exp = exp.strip_prefix('-').map_or_else(|| format!("+{exp}"), |e| format!("-{e:0>2}"));
        return format!("{mantissa}e{exp}");
    }
    let mut text = format!("{r:.6}");
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    if text == "-0.0" {
        text = "0.0".into();
    }
    text
}

fn escape_string(bytes: &[u8], out: &mut String) {
    out.push('(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(char::from(b));
            }
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push(')');
}

impl Interpreter {
    /// The `cvs` text of a value: contents for strings and names, digits
    /// for numbers, `--nostringval--` for composites.
    pub(crate) fn text_of(&self, v: &Value) -> Vec<u8> {
        match &v.object {
            Object::String(s) => self.vm.string(*s).map(<[u8]>::to_vec).unwrap_or_default(),
            Object::Name(n) => n.as_bytes().to_vec(),
            Object::Integer(i) => i.to_string().into_bytes(),
            Object::Real(r) => format_real(*r).into_bytes(),
            Object::Boolean(b) => b.to_string().into_bytes(),
            Object::Operator(op) => op.name.as_bytes().to_vec(),
            _ => b"--nostringval--".to_vec(),
        }
    }

    /// The `==` form of a value.
    pub(crate) fn syntax_of(&self, v: &Value) -> String {
        let mut out = String::new();
        self.write_syntax(v, 0, &mut out);
        out
    }

    fn write_syntax(&self, v: &Value, depth: usize, out: &mut String) {
        match &v.object {
            Object::Integer(i) => {
                let _ = write!(out, "{i}");
            }
            Object::Real(r) => out.push_str(&format_real(*r)),
            Object::Boolean(b) => {
                let _ = write!(out, "{b}");
            }
            Object::Name(n) => {
                if !v.executable {
                    out.push('/');
                }
                out.push_str(&n.text());
            }
            Object::String(s) => match self.vm.string(*s) {
                Ok(bytes) => escape_string(bytes, out),
                Err(_) => out.push_str("-string-"),
            },
            Object::Array(a) => {
                let (open, close) = if v.executable { ('{', '}') } else { ('[', ']') };
                if depth >= MAX_DEPTH || !v.access.can_read() {
                    out.push_str(if v.executable { "--proc--" } else { "-array-" });
                    return;
                }
                out.push(open);
                if let Ok(items) = self.vm.array(*a) {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push(' ');
                        }
                        self.write_syntax(item, depth + 1, out);
                    }
                }
                out.push(close);
            }
            Object::Matrix(m) => {
                out.push('[');
                for (i, x) in m.to_array().into_iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push_str(&format_real(x));
                }
                out.push(']');
            }
            Object::Dict(_) => out.push_str("-dict-"),
            Object::Operator(op) => {
                let _ = write!(out, "--{}--", op.name);
            }
            Object::File(_) => out.push_str("-file-"),
            Object::Mark => out.push_str("-mark-"),
            Object::Null => out.push_str("null"),
            Object::Save(_) => out.push_str("-save-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reals_keep_a_decimal_point() {
        assert_eq!(format_real(1.0), "1.0");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(-2.25), "-2.25");
        assert_eq!(format_real(1.0 / 3.0), "0.333333");
        assert_eq!(format_real(-0.0), "0.0");
    }

    #[test]
    fn large_and_tiny_reals_use_exponents() {
        assert_eq!(format_real(1e20), "1.0e+20");
        assert_eq!(format_real(1.5e-7), "1.5e-07");
    }

    #[test]
    fn strings_are_escaped() {
        let mut out = String::new();
        escape_string(b"a(b)\\\n\x01", &mut out);
        assert_eq!(out, "(a\\(b\\)\\\\\\n\\001)");
    }
}
