//! Canonical signatures → prototypes, documentation and marshalling bodies.
//!
//! A body marshals every argument into a native local, performs the call,
//! converts the results and hands them back through the signature's return
//! channel. The whole sequence sits in one `try` block whose `catch` turns
//! any native exception into the error argument and a zero result.

use gbind_normalize::signature::{BindReturn, CallStyle, CanonicalSignature, ReturnChannel};
use gbind_types::Ownership;

use crate::annotation::{doc_comment, prototype, Annotated};
use crate::error::{EmitError, Result};

/// The three pieces emitted for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFunction {
    pub forward_declaration: String,
    pub doc_comment: String,
    /// The braced function body.
    pub body: String,
}

impl EmittedFunction {
    /// Prototype line for the header.
    pub fn header_entry(&self) -> String {
        format!("{};", self.forward_declaration)
    }

    /// Documented definition for the source file.
    pub fn source_entry(&self) -> String {
        format!("{}\n{}\n{}", self.doc_comment, self.forward_declaration, self.body)
    }
}

/// Render one canonical signature.
pub fn emit(sig: &CanonicalSignature) -> Result<EmittedFunction> {
    Ok(EmittedFunction {
        forward_declaration: forward_declaration(sig),
        doc_comment: function_doc(sig),
        body: body(sig)?,
    })
}

pub fn forward_declaration(sig: &CanonicalSignature) -> String {
    prototype(
        &sig.result.target,
        &sig.name,
        sig.parameters().map(|p| (&p.target, p.name.as_str())),
    )
}

pub fn function_doc(sig: &CanonicalSignature) -> String {
    let mut args: Vec<Annotated> = sig
        .arguments
        .iter()
        .map(|a| Annotated::from_param(&a.param, "A"))
        .collect();
    args.extend(
        sig.out_arguments
            .iter()
            .map(|p| Annotated::from_param(p, "An out-param")),
    );
    args.push(Annotated::from_param(&sig.error_argument, "An error-out"));

    let mut ret = Annotated::from_param(&sig.result, "A");
    ret.out = false;
    doc_comment(&sig.name, &args, Some(&ret))
}

fn body(sig: &CanonicalSignature) -> Result<String> {
    let mut lines = Vec::new();
    let failure = format!("{} rv = 0;", sig.result.target);

    if let Some(init) = &sig.receiver_init {
        let receiver = receiver_name(sig)?;
        lines.push(format!("if (!{init} ({receiver}, {}))", sig.error_argument.name));
        lines.push("  {".to_string());
        lines.push(format!("    {failure}"));
        lines.push("    return rv;".to_string());
        lines.push("  }".to_string());
    }

    lines.push("try".to_string());
    lines.push("  {".to_string());
    for arg in &sig.arguments {
        lines.push(format!(
            "    {} real_{} = {};",
            arg.native_local,
            arg.param.name,
            arg.to_native.apply(&arg.param.name, &arg.meta)
        ));
    }
    if !sig.arguments.is_empty() {
        lines.push(String::new());
    }
    lines.extend(call_and_return(sig)?.into_iter().map(|l| indent(&l, 4)));
    lines.push("  }".to_string());
    lines.push("catch (const std::exception &e)".to_string());
    lines.push("  {".to_string());
    lines.push(format!(
        "    g_set_error ({}, G_IO_ERROR, G_IO_ERROR_FAILED, \"%s\", e.what ());",
        sig.error_argument.name
    ));
    lines.push(format!("    {failure}"));
    lines.push("    return rv;".to_string());
    lines.push("  }".to_string());

    let mut out = String::from("{\n");
    for line in lines {
        out.push_str(&indent(&line, 4));
        out.push('\n');
    }
    out.push('}');
    Ok(out)
}

fn call_and_return(sig: &CanonicalSignature) -> Result<Vec<String>> {
    let call = native_call(sig)?;
    let mut lines = Vec::new();

    match sig.channel {
        ReturnChannel::Receiver => {
            lines.push(format!("{call};"));
            lines.push(format!("return {};", receiver_name(sig)?));
        }
        ReturnChannel::Direct => {
            let [ret] = sig.returns.as_slice() else {
                return Err(invariant(sig, "a direct return needs exactly one native return"));
            };
            lines.push(format!("{} real_rv = {call};", ret.native_spelling));
            lines.push(convert_return(ret, "real_rv", "gobject_rv0"));
            lines.push(format!("return {};", return_operand(ret, "gobject_rv0")));
        }
        ReturnChannel::Status => {
            match sig.returns.as_slice() {
                [] => lines.push(format!("{call};")),
                [ret] => {
                    lines.push(format!("{} real_rv = {call};", ret.native_spelling));
                    lines.push(convert_return(ret, "real_rv", "gobject_rv0"));
                }
                returns => {
                    let tuple = returns
                        .iter()
                        .map(|r| r.native_spelling.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    lines.push(format!("std::tuple <{tuple}> real_rv = {call};"));
                    for (i, ret) in returns.iter().enumerate() {
                        lines.push(convert_return(
                            ret,
                            &format!("std::get<{i}> (real_rv)"),
                            &format!("gobject_rv{i}"),
                        ));
                    }
                }
            }
            if sig.out_arguments.len() != sig.returns.len() {
                return Err(invariant(sig, "every native return needs an out-argument"));
            }
            for (i, (out, ret)) in sig.out_arguments.iter().zip(&sig.returns).enumerate() {
                lines.push(format!("if ({} != NULL)", out.name));
                lines.push(format!(
                    "  *{} = {};",
                    out.name,
                    return_operand(ret, &format!("gobject_rv{i}"))
                ));
            }
            lines.push("return TRUE;".to_string());
        }
    }
    Ok(lines)
}

fn native_call(sig: &CanonicalSignature) -> Result<String> {
    let real = |name: &str| format!("real_{name}");
    match &sig.call {
        CallStyle::Free { namespace } => {
            let args: Vec<String> = sig.arguments.iter().map(|a| real(&a.param.name)).collect();
            Ok(format!("{namespace}::{} ({})", sig.native_name, args.join(", ")))
        }
        CallStyle::Method => {
            let Some((receiver, rest)) = sig.arguments.split_first() else {
                return Err(invariant(sig, "a method call needs a receiver argument"));
            };
            let args: Vec<String> = rest.iter().map(|a| real(&a.param.name)).collect();
            Ok(format!(
                "{}.{} ({})",
                real(&receiver.param.name),
                sig.native_name,
                args.join(", ")
            ))
        }
    }
}

fn convert_return(ret: &BindReturn, native: &str, var: &str) -> String {
    format!(
        "{} = {};",
        ret.cleanup.declare(&ret.target, var),
        ret.to_target.apply(native, &ret.meta)
    )
}

/// Owned values are stolen out of their auto-cleanup temporary.
fn return_operand(ret: &BindReturn, var: &str) -> String {
    match ret.ownership {
        Ownership::Full => format!("static_cast <{}> (g_steal_pointer (&{var}))", ret.target),
        Ownership::None | Ownership::Receiver => var.to_string(),
    }
}

fn receiver_name(sig: &CanonicalSignature) -> Result<&str> {
    sig.arguments
        .first()
        .map(|a| a.param.name.as_str())
        .ok_or_else(|| invariant(sig, "no receiver argument"))
}

fn invariant(sig: &CanonicalSignature, detail: &str) -> EmitError {
    EmitError::Invariant {
        name: sig.name.clone(),
        detail: detail.to_string(),
    }
}

pub(crate) fn indent(line: &str, width: usize) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{:width$}{line}", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbind_extract::{ArgumentDecl, FunctionDecl, ReturnDecl};
    use gbind_normalize::{normalize_function, NormalizeConfig, Normalized};
    use gbind_types::TypeMapper;

    fn arg(name: &str, native: &str) -> ArgumentDecl {
        ArgumentDecl {
            name: name.into(),
            native_type: native.into(),
            spelled_type: native.into(),
            nullable: false,
            size: None,
            annotation: None,
        }
    }

    fn ret(name: &str, native: &str) -> ReturnDecl {
        ReturnDecl {
            name: name.into(),
            native_type: native.into(),
            spelled_type: native.into(),
        }
    }

    fn signatures(
        name: &str,
        method_of: &[&str],
        args: Vec<ArgumentDecl>,
        returns: Vec<ReturnDecl>,
    ) -> Vec<CanonicalSignature> {
        let decl = FunctionDecl {
            name: name.into(),
            overload_name: String::new(),
            method_of: method_of.iter().map(|s| s.to_string()).collect(),
            schema_order_arguments: args.clone(),
            arguments: args,
            returns,
        };
        match normalize_function(&decl, &TypeMapper::with_defaults(), &NormalizeConfig::default())
            .unwrap()
        {
            Normalized::Bound(sigs) => sigs,
            Normalized::Skipped(record) => panic!("skipped: {}", record.reason),
        }
    }

    #[test]
    fn direct_return_method() {
        let sig = &signatures(
            "abs",
            &["Tensor"],
            vec![arg("self", "at::Tensor")],
            vec![ret("", "at::Tensor")],
        )[0];
        let emitted = emit(sig).unwrap();
        assert_eq!(
            emitted.header_entry(),
            "TorchTensor * torch_tensor_abs (TorchTensor * self, GError ** error);"
        );
        let expected = "\
{
    if (!torch_tensor_init_internal (self, error))
      {
        TorchTensor * rv = 0;
        return rv;
      }
    try
      {
        at::Tensor real_self = torch_convert_to_real (self);

        at::Tensor real_rv = real_self.abs ();
        g_autoptr (TorchTensor) gobject_rv0 = torch_convert_to_gobject (real_rv);
        return static_cast <TorchTensor *> (g_steal_pointer (&gobject_rv0));
      }
    catch (const std::exception &e)
      {
        g_set_error (error, G_IO_ERROR, G_IO_ERROR_FAILED, \"%s\", e.what ());
        TorchTensor * rv = 0;
        return rv;
      }
}";
        assert_eq!(emitted.body, expected);
    }

    #[test]
    fn tuple_return_writes_out_arguments() {
        let sig = &signatures(
            "aminmax",
            &["namespace"],
            vec![arg("self", "at::Tensor")],
            vec![ret("min", "at::Tensor"), ret("max", "at::Tensor")],
        )[0];
        let emitted = emit(sig).unwrap();
        assert_eq!(
            emitted.forward_declaration,
            "gboolean torch_aminmax (TorchTensor * self, TorchTensor ** min, TorchTensor ** max, GError ** error)"
        );
        let body = &emitted.body;
        assert!(body.contains(
            "        std::tuple <at::Tensor, at::Tensor> real_rv = torch::aminmax (real_self);\n"
        ));
        assert!(body.contains(
            "        g_autoptr (TorchTensor) gobject_rv1 = torch_convert_to_gobject (std::get<1> (real_rv));\n"
        ));
        assert!(body.contains(
            "        if (max != NULL)\n          *max = static_cast <TorchTensor *> (g_steal_pointer (&gobject_rv1));\n"
        ));
        assert!(body.contains("        return TRUE;\n"));
        assert!(body.contains("        gboolean rv = 0;\n"));
        assert!(!body.contains("torch_tensor_init_internal"));
    }

    #[test]
    fn value_out_argument_is_copied() {
        let sig = &signatures("dim", &["Tensor"], vec![arg("self", "at::Tensor")], vec![ret("", "int64_t")])[0];
        let body = emit(sig).unwrap().body;
        assert!(body.contains("        int64_t real_rv = real_self.dim ();\n"));
        assert!(body.contains("        int64_t gobject_rv0 = real_rv;\n"));
        assert!(body.contains("        if (out0 != NULL)\n          *out0 = gobject_rv0;\n"));
    }

    #[test]
    fn two_value_returns_are_copied_out() {
        let sig = &signatures(
            "count_mean",
            &["Tensor"],
            vec![arg("self", "at::Tensor")],
            vec![ret("count", "int64_t"), ret("mean", "double")],
        )[0];
        let emitted = emit(sig).unwrap();
        assert_eq!(
            emitted.forward_declaration,
            "gboolean torch_tensor_count_mean (TorchTensor * self, int64_t * count, double * mean, GError ** error)"
        );
        let body = &emitted.body;
        assert!(body.contains("        std::tuple <int64_t, double> real_rv = real_self.count_mean ();\n"));
        assert!(body.contains("        double gobject_rv1 = std::get<1> (real_rv);\n"));
        assert!(body.contains("        if (count != NULL)\n          *count = gobject_rv0;\n"));
        assert!(body.contains("        if (mean != NULL)\n          *mean = gobject_rv1;\n"));
        assert!(!body.contains("g_steal_pointer"));
    }

    #[test]
    fn receiver_is_returned_unconverted() {
        let mut self_arg = arg("self", "at::Tensor");
        self_arg.annotation = Some("a!".into());
        let sig = &signatures(
            "zero_",
            &["Tensor"],
            vec![self_arg],
            vec![ret("", "at::Tensor")],
        )[0];
        let emitted = emit(sig).unwrap();
        assert!(emitted.body.contains("        real_self.zero_ ();\n        return self;\n"));
        assert!(!emitted.body.contains("real_rv"));
        assert!(emitted
            .doc_comment
            .contains(" * Returns: (transfer none): A #TorchTensor *"));
    }

    #[test]
    fn no_returns_report_success() {
        let sig = &signatures("manual_seed", &["namespace"], vec![arg("seed", "int64_t")], vec![])[0];
        let body = emit(sig).unwrap().body;
        assert!(body.contains("        torch::manual_seed (real_seed);\n        return TRUE;\n"));
    }

    #[test]
    fn documentation_lists_every_parameter() {
        let sig = &signatures(
            "max",
            &["Tensor"],
            vec![arg("self", "at::Tensor"), arg("dim", "int64_t")],
            vec![ret("values", "at::Tensor"), ret("indices", "at::Tensor")],
        )[0];
        let expected = "\
/**
 * torch_tensor_max:
 * @self: (transfer none): A #TorchTensor *
 * @dim: A #int64_t
 * @values: (out) (transfer full) (nullable): An out-param #TorchTensor **
 * @indices: (out) (transfer full) (nullable): An out-param #TorchTensor **
 * @error: (out) (transfer full) (nullable): An error-out #GError **
 *
 * Returns: A #gboolean
 */";
        assert_eq!(function_doc(sig), expected);
    }

    #[test]
    fn scalar_variants_keep_native_local() {
        let sigs = signatures(
            "add",
            &["Tensor", "namespace"],
            vec![arg("self", "at::Tensor"), arg("other", "const at::Scalar &")],
            vec![ret("", "at::Tensor")],
        );
        let body = emit(&sigs[1]).unwrap().body;
        assert!(body.contains("        at::Scalar real_other = other;\n"));
        assert!(body.contains("torch::add (real_self, real_other)"));
    }
}
