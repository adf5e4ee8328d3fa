//! Documentation comment annotations.
//!
//! Every parameter line reads `@name: (ann) (ann): description`, annotations
//! in a fixed order: `(out)`, `(transfer …)`, `(element-type …)`,
//! `(array …)`, `(scope …)`, `(destroy …)`, `(nullable)`.

use gbind_normalize::signature::{Direction, Param};
use gbind_types::{ArrayLength, Ownership, TargetType};

/// One documented parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub name: String,
    pub ty: TargetType,
    pub out: bool,
    pub transfer: Option<Ownership>,
    pub element_type: Option<String>,
    pub array: Option<ArrayLength>,
    pub scope: Option<String>,
    pub destroy: Option<String>,
    pub nullable: bool,
    pub desc: String,
}

impl Annotated {
    /// A plain value described as `A #T`.
    pub fn new(name: impl Into<String>, ty: impl Into<TargetType>) -> Self {
        let ty = ty.into();
        Self {
            name: name.into(),
            desc: format!("A #{ty}"),
            ty,
            out: false,
            transfer: None,
            element_type: None,
            array: None,
            scope: None,
            destroy: None,
            nullable: false,
        }
    }

    pub fn transfer(mut self, transfer: Ownership) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn described(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Annotate a canonical parameter, describing it with `desc_prefix`
    /// (`A`, `An out-param`, `An error-out`).
    pub fn from_param(param: &Param, desc_prefix: &str) -> Self {
        Self {
            name: param.name.clone(),
            ty: param.target.clone(),
            out: param.direction == Direction::Out,
            transfer: Some(param.transfer),
            element_type: param.element_type.as_ref().map(|e| e.to_string()),
            array: param.array.clone(),
            scope: None,
            destroy: None,
            nullable: param.nullable,
            desc: format!("{desc_prefix} #{}", param.target),
        }
    }

    /// The annotation suffix (`": (transfer full) (nullable)"`), or empty.
    pub fn annotations(&self) -> String {
        let ty = self.ty.as_str();
        let mut parts = Vec::new();
        if self.out {
            parts.push("(out)".to_string());
        }
        if let Some(transfer) = self.transfer.filter(|_| ty.ends_with('*')) {
            parts.push(format!("(transfer {})", transfer.annotation()));
        }
        if let Some(element) = &self.element_type {
            parts.push(format!("(element-type {})", element.trim_matches(|c| c == ' ' || c == '*')));
        }
        match &self.array {
            Some(ArrayLength::Fixed(n)) => parts.push(format!("(array fixed-size={n})")),
            Some(ArrayLength::Param(p)) => parts.push(format!("(array length={p})")),
            None => {}
        }
        if let Some(scope) = &self.scope {
            parts.push(format!("(scope {scope})"));
        }
        if let Some(destroy) = &self.destroy {
            parts.push(format!("(destroy {destroy})"));
        }
        if self.nullable && ty.contains('*') {
            parts.push("(nullable)".to_string());
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(": {}", parts.join(" "))
        }
    }

    pub fn arg_line(&self) -> String {
        format!("@{}{}: {}", self.name, self.annotations(), self.desc)
    }

    /// The `Returns` line; `None` for `void`.
    pub fn return_line(&self) -> Option<String> {
        (self.ty.as_str() != "void")
            .then(|| format!("Returns{}: {}", self.annotations(), self.desc))
    }
}

/// A `/** … */` block documenting `name`.
pub fn doc_comment(name: &str, args: &[Annotated], ret: Option<&Annotated>) -> String {
    let mut lines = vec!["/**".to_string(), format!(" * {name}:")];
    lines.extend(args.iter().map(|a| format!(" * {}", a.arg_line())));
    if let Some(line) = ret.and_then(Annotated::return_line) {
        lines.push(" *".to_string());
        lines.push(format!(" * {line}"));
    }
    lines.push(" */".to_string());
    lines.join("\n")
}

/// `RET name (T a, T b)`; an empty parameter list is spelled `void`.
pub fn prototype<'a>(
    ret: &TargetType,
    name: &str,
    params: impl IntoIterator<Item = (&'a TargetType, &'a str)>,
) -> String {
    let params: Vec<String> = params
        .into_iter()
        .map(|(ty, name)| format!("{ty} {name}"))
        .collect();
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    format!("{ret} {name} ({params})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_order() {
        let mut a = Annotated::new("sizes", "GArray *")
            .transfer(Ownership::None)
            .nullable(true);
        a.element_type = Some("gint64".into());
        a.array = Some(ArrayLength::Param("n".into()));
        assert_eq!(
            a.annotations(),
            ": (transfer none) (element-type gint64) (array length=n) (nullable)"
        );
    }

    #[test]
    fn value_types_carry_no_transfer_or_nullable() {
        let a = Annotated::new("dim", "int64_t").transfer(Ownership::Full).nullable(true);
        assert_eq!(a.annotations(), "");
        assert_eq!(a.arg_line(), "@dim: A #int64_t");
    }

    #[test]
    fn receiver_transfer_is_none() {
        let a = Annotated::new("", "TorchTensor *").transfer(Ownership::Receiver);
        assert_eq!(a.return_line().unwrap(), "Returns: (transfer none): A #TorchTensor *");
        assert!(Annotated::new("", "void").return_line().is_none());
    }

    #[test]
    fn out_and_fixed_arrays() {
        let mut a = Annotated::new("out0", "long **").transfer(Ownership::Full).nullable(true);
        a.out = true;
        a.array = Some(ArrayLength::Fixed(2));
        assert_eq!(
            a.annotations(),
            ": (out) (transfer full) (array fixed-size=2) (nullable)"
        );
    }

    #[test]
    fn doc_block_and_prototype() {
        let args = vec![Annotated::new("opts", "TorchX *")
            .transfer(Ownership::Full)
            .described("The #TorchX to free.")];
        let doc = doc_comment("torch_x_free", &args, Some(&Annotated::new("", "void")));
        assert_eq!(
            doc,
            "/**\n * torch_x_free:\n * @opts: (transfer full): The #TorchX to free.\n */"
        );
        let ty = TargetType::new("TorchX *");
        assert_eq!(
            prototype(&TargetType::new("void"), "torch_x_free", [(&ty, "opts")]),
            "void torch_x_free (TorchX * opts)"
        );
        assert_eq!(prototype(&TargetType::new("GType"), "torch_x_get_type", []), "GType torch_x_get_type (void)");
    }
}
