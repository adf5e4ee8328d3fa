//! Hand-written native (C++) type shape parser.
//!
//! Native type spellings arrive from header text and declaration feeds in
//! many equivalent forms (`const at::Tensor &`, `at::Tensor const&`, ...).
//! [`canonicalize`] reduces them to a single spelling and
//! [`NativeType::parse`] classifies that spelling into a closed set of
//! shapes so that every shape has an explicit mapping strategy.
//!
//! Does NOT handle function pointers, array declarators or attributes.

use crate::error::{MapError, Result};

/// Compile-time arity of an expanding array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    /// A literal arity, e.g. `ExpandingArray<2>`.
    Fixed(usize),
    /// A template parameter, e.g. `ExpandingArray<D>`.
    Symbolic(String),
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Symbolic(p) => write!(f, "{p}"),
        }
    }
}

/// The shape of a native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    Void,
    /// A plain (possibly namespace-qualified) type name.
    Named(String),
    /// `c10::optional<T>` / `std::optional<T>`.
    Optional {
        wrapper: String,
        inner: Box<NativeType>,
    },
    /// `std::vector<T>`, `c10::ArrayRef<T>`, `c10::List<T>`.
    Sequence {
        container: String,
        element: Box<NativeType>,
    },
    /// `ExpandingArray<N[, T]>`.
    Expanding {
        template: String,
        arity: Arity,
        element: Option<Box<NativeType>>,
    },
    /// `std::function<R(A, ...)>`.
    Callback {
        wrapper: String,
        ret: Box<NativeType>,
        args: Vec<NativeType>,
    },
    /// `c10::variant<A, B, ...>`.
    Variant { wrapper: String, arms: Vec<NativeType> },
    /// Any other template instantiation.
    Template { name: String, args: Vec<NativeType> },
}

/// Element type of an expanding array that does not name one.
pub const DEFAULT_EXPANDING_ELEMENT: &str = "int64_t";

impl NativeType {
    /// Parse a native type spelling into its shape.
    ///
    /// Examples:
    /// - `"const at::Tensor &"` → `Named("at::Tensor")`
    /// - `"c10::optional<int64_t>"` → `Optional { inner: Named("int64_t"), .. }`
    /// - `"ExpandingArray<D>"` → `Expanding { arity: Symbolic("D"), .. }`
    pub fn parse(input: &str) -> Result<Self> {
        let spelling = canonicalize(input);
        if spelling.is_empty() {
            return Err(MapError::InvalidNativeType {
                detail: format!("empty type in '{input}'"),
            });
        }
        parse_canonical(&spelling)
    }

    /// The element type of an expanding array, defaulting to `int64_t`.
    pub fn expanding_element(&self) -> Option<NativeType> {
        match self {
            NativeType::Expanding { element, .. } => Some(
                element
                    .as_deref()
                    .cloned()
                    .unwrap_or_else(|| NativeType::Named(DEFAULT_EXPANDING_ELEMENT.to_string())),
            ),
            _ => None,
        }
    }

    /// Whether this is the `void` type.
    pub fn is_void(&self) -> bool {
        matches!(self, NativeType::Void)
    }
}

impl std::fmt::Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeType::Void => write!(f, "void"),
            NativeType::Named(name) => write!(f, "{name}"),
            NativeType::Optional { wrapper, inner } => write!(f, "{wrapper}<{inner}>"),
            NativeType::Sequence { container, element } => write!(f, "{container}<{element}>"),
            NativeType::Expanding {
                template,
                arity,
                element,
            } => match element {
                Some(element) => write!(f, "{template}<{arity},{element}>"),
                None => write!(f, "{template}<{arity}>"),
            },
            NativeType::Callback { wrapper, ret, args } => {
                write!(f, "{wrapper}<{ret}(")?;
                write_list(f, args)?;
                write!(f, ")>")
            }
            NativeType::Variant { wrapper, arms } => {
                write!(f, "{wrapper}<")?;
                write_list(f, arms)?;
                write!(f, ">")
            }
            NativeType::Template { name, args } => {
                write!(f, "{name}<")?;
                write_list(f, args)?;
                write!(f, ">")
            }
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[NativeType]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Reduce a native type spelling to its canonical, unqualified form.
///
/// Drops `const`, `volatile`, `struct`, `&` and `*`, and removes whitespace
/// except between two identifier tokens (`unsigned int`).
pub fn canonicalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if is_ident_char(c) {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if !is_ident_char(c) {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            if matches!(ident.as_str(), "const" | "volatile" | "struct") {
                continue;
            }
            if pending_space && out.chars().last().is_some_and(is_ident_char) {
                out.push(' ');
            }
            pending_space = false;
            out.push_str(&ident);
        } else {
            chars.next();
            if c.is_whitespace() {
                pending_space = true;
            } else if c != '&' && c != '*' {
                pending_space = false;
                out.push(c);
            }
        }
    }

    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

/// Split `s` on `sep` occurrences that are not nested inside `<>` or `()`.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Find the index of the bracket closing the one opened at `open`.
fn matching_close(s: &str, open: usize, open_ch: char, close_ch: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        if c == open_ch {
            depth += 1;
        } else if c == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn parse_canonical(s: &str) -> Result<NativeType> {
    if s == "void" {
        return Ok(NativeType::Void);
    }

    let Some(lt) = s.find('<') else {
        if s.contains(['(', ')', '>', ',']) {
            return Err(MapError::InvalidNativeType {
                detail: format!("unexpected punctuation in '{s}'"),
            });
        }
        return Ok(NativeType::Named(s.to_string()));
    };

    let gt = matching_close(s, lt, '<', '>').ok_or_else(|| MapError::InvalidNativeType {
        detail: format!("unbalanced '<' in '{s}'"),
    })?;
    if gt != s.len() - 1 {
        return Err(MapError::InvalidNativeType {
            detail: format!("trailing text after template in '{s}'"),
        });
    }

    let name = &s[..lt];
    let inner = &s[lt + 1..gt];

    match last_segment(name) {
        "optional" => Ok(NativeType::Optional {
            wrapper: name.to_string(),
            inner: Box::new(parse_single_arg(name, inner)?),
        }),
        "vector" | "ArrayRef" | "List" => Ok(NativeType::Sequence {
            container: name.to_string(),
            element: Box::new(parse_single_arg(name, inner)?),
        }),
        "ExpandingArray" => parse_expanding(name, inner),
        "function" => parse_callback(name, inner),
        "variant" => Ok(NativeType::Variant {
            wrapper: name.to_string(),
            arms: parse_args(inner)?,
        }),
        _ => Ok(NativeType::Template {
            name: name.to_string(),
            args: parse_args(inner)?,
        }),
    }
}

fn parse_args(inner: &str) -> Result<Vec<NativeType>> {
    split_top_level(inner, ',')
        .into_iter()
        .map(parse_canonical)
        .collect()
}

fn parse_single_arg(name: &str, inner: &str) -> Result<NativeType> {
    let mut args = parse_args(inner)?;
    if args.len() != 1 {
        return Err(MapError::InvalidNativeType {
            detail: format!("'{name}' expects one template argument, got {}", args.len()),
        });
    }
    Ok(args.remove(0))
}

fn parse_expanding(name: &str, inner: &str) -> Result<NativeType> {
    let parts = split_top_level(inner, ',');
    let (arity, element) = match parts.as_slice() {
        [arity] => (*arity, None),
        [arity, element] => (*arity, Some(Box::new(parse_canonical(element)?))),
        _ => {
            return Err(MapError::InvalidNativeType {
                detail: format!("'{name}' expects one or two template arguments"),
            })
        }
    };
    let arity = match arity.parse::<usize>() {
        Ok(n) => Arity::Fixed(n),
        Err(_) => Arity::Symbolic(arity.to_string()),
    };
    Ok(NativeType::Expanding {
        template: name.to_string(),
        arity,
        element,
    })
}

fn parse_callback(name: &str, inner: &str) -> Result<NativeType> {
    let open = inner.find('(').ok_or_else(|| MapError::InvalidNativeType {
        detail: format!("'{name}' expects a function signature"),
    })?;
    let close = matching_close(inner, open, '(', ')').ok_or_else(|| MapError::InvalidNativeType {
        detail: format!("unbalanced '(' in '{inner}'"),
    })?;
    let ret = parse_canonical(inner[..open].trim())?;
    let params = inner[open + 1..close].trim();
    let args = if params.is_empty() || params == "void" {
        Vec::new()
    } else {
        parse_args(params)?
    };
    Ok(NativeType::Callback {
        wrapper: name.to_string(),
        ret: Box::new(ret),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_qualifiers() {
        assert_eq!(canonicalize("const at::Tensor &"), "at::Tensor");
        assert_eq!(canonicalize("at::Tensor const&"), "at::Tensor");
        assert_eq!(canonicalize("TorchTensor *"), "TorchTensor");
        assert_eq!(canonicalize("unsigned  int"), "unsigned int");
        assert_eq!(
            canonicalize("c10::optional< at::Tensor > const &"),
            "c10::optional<at::Tensor>"
        );
    }

    #[test]
    fn parse_named() {
        assert_eq!(
            NativeType::parse("const at::Tensor &").unwrap(),
            NativeType::Named("at::Tensor".into())
        );
        assert!(NativeType::parse("void").unwrap().is_void());
    }

    #[test]
    fn parse_optional() {
        let ty = NativeType::parse("c10::optional<int64_t>").unwrap();
        match &ty {
            NativeType::Optional { wrapper, inner } => {
                assert_eq!(wrapper, "c10::optional");
                assert_eq!(inner.as_ref(), &NativeType::Named("int64_t".into()));
            }
            other => panic!("expected Optional, got {other:?}"),
        }
        assert_eq!(ty.to_string(), "c10::optional<int64_t>");
    }

    #[test]
    fn parse_nested_sequence() {
        let ty = NativeType::parse("std::vector<c10::optional<at::Tensor>>").unwrap();
        match ty {
            NativeType::Sequence { element, .. } => {
                assert!(matches!(*element, NativeType::Optional { .. }));
            }
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn parse_expanding_arity() {
        let fixed = NativeType::parse("ExpandingArray<2>").unwrap();
        assert!(matches!(
            fixed,
            NativeType::Expanding { arity: Arity::Fixed(2), element: None, .. }
        ));
        assert_eq!(
            fixed.expanding_element(),
            Some(NativeType::Named("int64_t".into()))
        );

        let symbolic = NativeType::parse("torch::ExpandingArray<D, double>").unwrap();
        match &symbolic {
            NativeType::Expanding { arity, element, .. } => {
                assert_eq!(arity, &Arity::Symbolic("D".into()));
                assert_eq!(element.as_deref(), Some(&NativeType::Named("double".into())));
            }
            other => panic!("expected Expanding, got {other:?}"),
        }
        assert_eq!(symbolic.to_string(), "torch::ExpandingArray<D,double>");
    }

    #[test]
    fn parse_callback_signature() {
        let ty = NativeType::parse(
            "std::function<at::Tensor (const at::Tensor &, const at::Tensor &)>",
        )
        .unwrap();
        match &ty {
            NativeType::Callback { ret, args, .. } => {
                assert_eq!(ret.as_ref(), &NativeType::Named("at::Tensor".into()));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Callback, got {other:?}"),
        }
        assert_eq!(
            ty.to_string(),
            "std::function<at::Tensor(at::Tensor,at::Tensor)>"
        );

        let void_ty = NativeType::parse("std::function<void()>").unwrap();
        assert!(matches!(void_ty, NativeType::Callback { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn parse_variant_arms() {
        let ty = NativeType::parse("c10::variant<enumtype::kNone, enumtype::kMean>").unwrap();
        match ty {
            NativeType::Variant { arms, .. } => assert_eq!(
                arms,
                vec![
                    NativeType::Named("enumtype::kNone".into()),
                    NativeType::Named("enumtype::kMean".into()),
                ]
            ),
            other => panic!("expected Variant, got {other:?}"),
        }
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(
            split_top_level("a<b, c>, d(e, f), g", ','),
            vec!["a<b, c>", "d(e, f)", "g"]
        );
        assert!(split_top_level("", ',').is_empty());
    }

    #[test]
    fn parse_invalid() {
        assert!(NativeType::parse("").is_err());
        assert!(NativeType::parse("foo<bar").is_err());
        assert!(NativeType::parse("c10::optional<a, b>").is_err());
    }
}
