//! Java templates: enums for enumerations and dictionaries, final classes
//! for bitfields and classification nodes.

use std::fmt::Write as FmtWrite;

use disenum_registry::{
    BitSize, BitfieldType, ClassificationTree, DictionaryType, EnumerationType, NodeId,
};

use super::{codes, comment_text, mask, member_scope, RenderContext, SourceFile, Template};
use crate::error::CodegenError;
use crate::mapping::escape_string;

/// Renders Java sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaTemplate;

fn header(cx: &RenderContext<'_>, title: &str) -> SourceFile {
    let mut f = SourceFile::new();
    let _ = writeln!(f.buf, "package {};", cx.namespace_path());
    f.blank();
    f.line("/**");
    let _ = writeln!(f.buf, " * {}", comment_text(title));
    f.line(" *");
    let _ = writeln!(f.buf, " * {}", cx.provenance());
    f.line(" */");
    f
}

fn value_type(size: BitSize) -> (&'static str, &'static str) {
    match size {
        BitSize::ThirtyTwo => ("long", "L"),
        BitSize::Eight | BitSize::Sixteen => ("int", ""),
    }
}

impl Template for JavaTemplate {
    fn enumeration(&self, cx: &RenderContext<'_>, e: &EnumerationType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let (ty, suffix) = value_type(e.bit_size);
        let mut members = member_scope(&["BIT_SIZE", "value", "description"]);
        let mut f = header(cx, &e.raw_name);
        let _ = writeln!(f.buf, "public enum {name} {{");
        for (i, row) in e.rows.iter().enumerate() {
            let _ = writeln!(f.buf, "    /** {} */", comment_text(&row.description));
            let sep = if i + 1 == e.rows.len() { ';' } else { ',' };
            let _ = writeln!(
                f.buf,
                "    {}({}{suffix}, \"{}\"){sep}",
                members.claim(&cx.member(&row.name))?,
                row.value,
                escape_string(&row.description)
            );
        }
        if e.rows.is_empty() {
            f.line("    ;");
        }
        f.blank();
        f.line("    /** Size of the wire representation in bits. */");
        let _ = writeln!(f.buf, "    public static final int BIT_SIZE = {};", e.bit_size.bits());
        f.blank();
        let _ = writeln!(f.buf, "    private final {ty} value;");
        f.line("    private final String description;");
        f.blank();
        let _ = writeln!(f.buf, "    {name}({ty} value, String description) {{");
        f.line("        this.value = value;");
        f.line("        this.description = description;");
        f.line("    }");
        f.blank();
        let _ = writeln!(f.buf, "    public {ty} getValue() {{");
        f.line("        return value;");
        f.line("    }");
        f.blank();
        f.line("    public String getDescription() {");
        f.line("        return description;");
        f.line("    }");
        f.blank();
        f.line("    /** Returns the constant with the given value, or null. */");
        let _ = writeln!(f.buf, "    public static {name} fromValue({ty} value) {{");
        let _ = writeln!(f.buf, "        for ({name} e : values()) {{");
        f.line("            if (e.value == value) {");
        f.line("                return e;");
        f.line("            }");
        f.line("        }");
        f.line("        return null;");
        f.line("    }");
        f.line("}");
        Ok(f.finish())
    }

    fn bitfield(&self, cx: &RenderContext<'_>, b: &BitfieldType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut getters = member_scope(&["getBits", "getClass"]);
        let mut f = header(cx, &b.raw_name);
        let _ = writeln!(f.buf, "public final class {name} {{");
        let _ = writeln!(f.buf, "    public static final int SIZE_BITS = {};", b.total_bits);
        let _ = writeln!(f.buf, "    public static final int PADDING_BITS = {};", b.padding_bits());
        f.blank();
        f.line("    private final long bits;");
        f.blank();
        let _ = writeln!(f.buf, "    public {name}(long bits) {{");
        f.line("        this.bits = bits;");
        f.line("    }");
        f.blank();
        f.line("    public long getBits() {");
        f.line("        return bits;");
        f.line("    }");
        for row in &b.rows {
            let getter = getters.claim(&format!("get{}", accessor(&cx.member(&row.name))))?;
            let extract = format!(
                "(int) ((bits >>> {}) & 0x{:X}L)",
                row.bit_position,
                mask(row.length)
            );
            f.blank();
            let _ = writeln!(f.buf, "    /** {} */", comment_text(&row.description));
            match cx.enumeration_ref(row.cross_reference.as_ref()) {
                Some(target) => {
                    let _ = writeln!(f.buf, "    public {} {getter}() {{", target.fqn);
                    let _ = writeln!(f.buf, "        return {}.fromValue({extract});", target.fqn);
                }
                None => {
                    let _ = writeln!(f.buf, "    public int {getter}() {{");
                    let _ = writeln!(f.buf, "        return {extract};");
                }
            }
            f.line("    }");
        }
        f.line("}");
        Ok(f.finish())
    }

    fn dictionary(&self, cx: &RenderContext<'_>, d: &DictionaryType) -> String {
        let name = cx.identifier;
        let mut f = header(cx, &d.raw_name);
        let _ = writeln!(f.buf, "public enum {name} {{");
        for (i, row) in d.rows.iter().enumerate() {
            let sep = if i + 1 == d.rows.len() { ';' } else { ',' };
            let _ = writeln!(
                f.buf,
                "    {}(\"{}\", \"{}\"){sep}",
                cx.member(&row.name),
                escape_string(&row.value),
                escape_string(&row.description)
            );
        }
        if d.rows.is_empty() {
            f.line("    ;");
        }
        f.blank();
        f.line("    private final String code;");
        f.line("    private final String description;");
        f.blank();
        let _ = writeln!(f.buf, "    {name}(String code, String description) {{");
        f.line("        this.code = code;");
        f.line("        this.description = description;");
        f.line("    }");
        f.blank();
        f.line("    public String getCode() {");
        f.line("        return code;");
        f.line("    }");
        f.blank();
        f.line("    public String getDescription() {");
        f.line("        return description;");
        f.line("    }");
        f.line("}");
        f.finish()
    }

    fn classification(
        &self,
        cx: &RenderContext<'_>,
        tree: &ClassificationTree,
        node: NodeId,
    ) -> String {
        let n = tree.node(node);
        let name = cx.identifier;
        let mut f = header(cx, &n.raw_description);
        let codes = codes(tree, node)
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(f.buf, "public final class {name} {{");
        let _ = writeln!(f.buf, "    public static final String LEVEL = \"{}\";", n.level);
        let _ = writeln!(f.buf, "    public static final int VALUE = {};", n.value);
        let _ = writeln!(
            f.buf,
            "    public static final String DESCRIPTION = \"{}\";",
            escape_string(&n.raw_description)
        );
        f.line("    /** Codes from the root of the hierarchy down to this node. */");
        let _ = writeln!(f.buf, "    public static final int[] CODES = {{{codes}}};");
        f.blank();
        let _ = writeln!(f.buf, "    private {name}() {{");
        f.line("    }");
        f.line("}");
        f.finish()
    }
}

/// Accessor suffix: the member with its first letter upper-cased.
fn accessor(member: &str) -> String {
    let mut chars = member.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => {
            let mut result = c.to_uppercase().to_string();
            result.push_str(chars.as_str());
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_capitalizes() {
        assert_eq!(accessor("marking"), "Marking");
        assert_eq!(accessor("_7"), "_7");
    }
}
