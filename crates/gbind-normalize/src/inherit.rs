//! Options-struct inheritance.
//!
//! Parent links form a forest over struct names. Structs are visited
//! parents first (Kahn's algorithm, ready queue kept sorted) and each child
//! receives a copy of its parent's already-complete field list after its
//! own fields. Forward references in the input are fine; missing parents
//! and cycles are errors.

use std::collections::BTreeMap;

use crate::error::{NormalizeError, Result};
use crate::options::OptionsStruct;

/// Resolve inheritance, returning the structs in their original order.
pub fn propagate(mut structs: Vec<OptionsStruct>) -> Result<Vec<OptionsStruct>> {
    let order = inheritance_order(&structs)?;
    let index: BTreeMap<String, usize> = structs
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.clone(), i))
        .collect();

    for i in order {
        let Some(parent) = structs[i].parent.clone() else {
            continue;
        };
        let Some(&p) = index.get(&parent) else {
            continue;
        };
        let inherited: Vec<_> = structs[p]
            .fields
            .iter()
            .filter(|f| structs[i].field(&f.name).is_none())
            .map(|f| {
                let mut f = f.clone();
                f.inherited_from.get_or_insert_with(|| parent.clone());
                f
            })
            .collect();
        let parent_constructor = structs[p].native_constructor.clone();

        let child = &mut structs[i];
        tracing::trace!(child = %child.name, %parent, inherited = inherited.len(), "inherit fields");
        child.fields.extend(inherited);
        if child.native_constructor.is_empty() {
            child.native_constructor = parent_constructor;
        }
    }
    Ok(structs)
}

/// Indices of `structs` ordered so every parent precedes its children.
pub fn inheritance_order(structs: &[OptionsStruct]) -> Result<Vec<usize>> {
    let index: BTreeMap<&str, usize> = structs
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut in_degree = vec![0usize; structs.len()];
    for (i, s) in structs.iter().enumerate() {
        let Some(parent) = &s.parent else {
            continue;
        };
        let Some(&p) = index.get(parent.as_str()) else {
            return Err(NormalizeError::UnknownParent {
                structure: s.name.clone(),
                parent: parent.clone(),
            });
        };
        children.entry(p).or_default().push(i);
        in_degree[i] += 1;
    }

    let mut queue: Vec<usize> = (0..structs.len()).filter(|&i| in_degree[i] == 0).collect();
    queue.sort_by(|a, b| structs[*b].name.cmp(&structs[*a].name));

    let mut order = Vec::with_capacity(structs.len());
    while let Some(i) = queue.pop() {
        order.push(i);
        for &child in children.get(&i).map(Vec::as_slice).unwrap_or_default() {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push(child);
            }
        }
        // Popping from the back yields names in ascending order.
        queue.sort_by(|a, b| structs[*b].name.cmp(&structs[*a].name));
    }

    if order.len() < structs.len() {
        let stuck = (0..structs.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| structs[i].name.as_str())
            .min()
            .unwrap_or_default();
        return Err(NormalizeError::InheritanceCycle {
            structure: stuck.to_string(),
        });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionField;
    use gbind_types::{Conversion, Meta, TargetType};

    fn field(name: &str) -> OptionField {
        OptionField {
            name: name.into(),
            c_type: TargetType::new("int64_t"),
            storage: TargetType::new("int64_t"),
            storage_element: None,
            element_type: None,
            length: None,
            callback: None,
            to_native: Conversion::Identity,
            meta: Meta::new(),
            default: None,
            inherited_from: None,
        }
    }

    fn options(name: &str, parent: Option<&str>, fields: &[&str]) -> OptionsStruct {
        OptionsStruct {
            name: name.into(),
            type_name: format!("Torch{name}"),
            snake: name.to_lowercase(),
            cpp: name.into(),
            parent: parent.map(str::to_string),
            fields: fields.iter().map(|f| field(f)).collect(),
            native_constructor: vec![],
        }
    }

    #[test]
    fn child_then_parent_fields() {
        let structs = vec![
            options("Child", Some("Base"), &["a", "b"]),
            options("Base", None, &["c"]),
        ];
        let resolved = propagate(structs).unwrap();
        assert_eq!(resolved[0].constructor_names(), vec!["a", "b", "c"]);
        assert_eq!(resolved[0].fields[2].inherited_from.as_deref(), Some("Base"));
        assert_eq!(resolved[1].constructor_names(), vec!["c"]);
    }

    #[test]
    fn deep_chain_sums_ancestors() {
        let structs = vec![
            options("Leaf", Some("Mid"), &["x"]),
            options("Mid", Some("Root"), &["y", "z"]),
            options("Root", None, &["r1", "r2"]),
        ];
        let resolved = propagate(structs).unwrap();
        assert_eq!(resolved[0].constructor_names(), vec!["x", "y", "z", "r1", "r2"]);
        // Inherited through Mid, but first declared on Root.
        assert_eq!(resolved[0].fields[4].inherited_from.as_deref(), Some("Root"));
    }

    #[test]
    fn child_overrides_parent_field() {
        let structs = vec![
            options("Base", None, &["a", "b"]),
            options("Child", Some("Base"), &["b", "c"]),
        ];
        let resolved = propagate(structs).unwrap();
        assert_eq!(resolved[1].constructor_names(), vec!["b", "c", "a"]);
        assert!(resolved[1].fields[0].inherited_from.is_none());
    }

    #[test]
    fn constructor_is_inherited_when_absent() {
        let mut base = options("Base", None, &["a"]);
        base.native_constructor = vec!["a".into()];
        let mut own = options("Own", Some("Base"), &["b"]);
        own.native_constructor = vec!["b".into()];
        let resolved = propagate(vec![base, options("Plain", Some("Base"), &[]), own]).unwrap();
        assert_eq!(resolved[1].native_constructor, vec!["a"]);
        assert_eq!(resolved[2].native_constructor, vec!["b"]);
    }

    #[test]
    fn parents_come_first_in_name_order() {
        let structs = vec![
            options("B", Some("A"), &[]),
            options("C", None, &[]),
            options("A", None, &[]),
        ];
        let order = inheritance_order(&structs).unwrap();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn unknown_parent() {
        let err = propagate(vec![options("X", Some("Missing"), &[])]).unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownParent { ref parent, .. } if parent == "Missing"));
    }

    #[test]
    fn cycles_are_rejected() {
        let structs = vec![
            options("A", Some("B"), &[]),
            options("B", Some("A"), &[]),
            options("Free", None, &[]),
        ];
        let err = propagate(structs).unwrap_err();
        assert!(matches!(err, NormalizeError::InheritanceCycle { ref structure } if structure == "A"));
    }
}
