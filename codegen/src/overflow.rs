//! Splitting of oversized enumerations into a primary and satellites.

use disenum_registry::EnumerationType;

use crate::error::CodegenError;
use crate::identifier::NameScope;

/// Maximum number of rows one emitted enumeration may carry.
pub const ROW_CEILING: usize = 4096;

/// Partitions `primary` into blocks of at most `ceiling` rows.
///
/// The first block keeps the primary's name and row identifiers. Each
/// further block becomes a satellite named `<primary>Additional`,
/// `<primary>Additional2`, ..., claimed in `types`, whose rows are
/// re-resolved in a fresh scope. Satellites share the primary's UID.
/// Enumerations within the ceiling are returned unchanged.
///
/// # Errors
///
/// Returns [`CodegenError::UniquenessExhausted`] if a satellite name or a
/// satellite row cannot be made unique.
pub fn split(
    mut primary: EnumerationType,
    ceiling: usize,
    types: &mut NameScope,
) -> Result<Vec<EnumerationType>, CodegenError> {
    let ceiling = ceiling.max(1);
    if primary.rows.len() <= ceiling {
        return Ok(vec![primary]);
    }

    let mut rest = primary.rows.split_off(ceiling);
    let mut out = Vec::with_capacity(1 + rest.len().div_ceil(ceiling));
    let mut ordinal = 1usize;
    while !rest.is_empty() {
        let tail = rest.split_off(rest.len().min(ceiling));
        let mut block = std::mem::replace(&mut rest, tail);

        let suffix = if ordinal == 1 {
            "Additional".to_string()
        } else {
            format!("Additional{ordinal}")
        };
        let name = types.claim(&format!("{}{suffix}", primary.name))?;

        let mut scope = NameScope::new();
        for row in &mut block {
            row.name = scope.claim(&row.base_name)?;
        }

        tracing::debug!(
            uid = %primary.uid,
            satellite = %name,
            rows = block.len(),
            "split oversized enumeration"
        );
        out.push(EnumerationType {
            uid: primary.uid.clone(),
            raw_name: primary.raw_name.clone(),
            name,
            bit_size: primary.bit_size,
            footnote: primary.footnote.clone(),
            rows: block,
        });
        ordinal += 1;
    }
    out.insert(0, primary);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use disenum_registry::{BitSize, EnumerationRow};

    fn enumeration(name: &str, rows: usize) -> EnumerationType {
        EnumerationType {
            uid: "500".to_string(),
            raw_name: name.to_string(),
            name: name.to_string(),
            bit_size: BitSize::Sixteen,
            footnote: None,
            rows: (0..rows)
                .map(|i| EnumerationRow {
                    value: i as i64,
                    range_end: None,
                    description: format!("Row {i}"),
                    footnote: None,
                    cross_reference: None,
                    base_name: format!("Row_{i}"),
                    name: format!("Row_{i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn small_enumeration_is_untouched() {
        let mut types = NameScope::new();
        let parts = split(enumeration("Foo", 10), ROW_CEILING, &mut types).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].rows.len(), 10);
        assert!(types.is_empty());
    }

    #[test]
    fn five_thousand_rows_make_one_satellite() {
        let mut types = NameScope::new();
        types.claim("Foo").unwrap();
        let parts = split(enumeration("Foo", 5000), ROW_CEILING, &mut types).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "Foo");
        assert_eq!(parts[0].rows.len(), 4096);
        assert_eq!(parts[1].name, "FooAdditional");
        assert_eq!(parts[1].rows.len(), 904);
        assert_eq!(parts[1].rows[0].value, 4096);
        assert_eq!(parts[1].uid, "500");
    }

    #[test]
    fn further_satellites_are_numbered() {
        let mut types = NameScope::new();
        let parts = split(enumeration("Foo", 25), 10, &mut types).unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "FooAdditional", "FooAdditional2"]);
        let total: usize = parts.iter().map(|p| p.rows.len()).sum();
        assert_eq!(total, 25);
    }

    #[test]
    fn satellite_names_avoid_existing_types() {
        let mut types = NameScope::new();
        types.claim("FooAdditional").unwrap();
        let parts = split(enumeration("Foo", 3), 2, &mut types).unwrap();
        assert_eq!(parts[1].name, "FooAdditional1");
    }

    #[test]
    fn satellite_rows_are_rescoped() {
        let mut e = enumeration("Foo", 4);
        for row in &mut e.rows {
            row.base_name = "Spare".to_string();
        }
        e.rows[2].name = "Spare2".to_string();
        e.rows[3].name = "Spare3".to_string();
        let mut types = NameScope::new();
        let parts = split(e, 2, &mut types).unwrap();
        let names: Vec<&str> = parts[1].rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Spare", "Spare1"]);
    }
}
