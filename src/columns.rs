use tracing::debug;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MainPanel,
    UnitOfAssessment,
    SubProfile,
    ThreeStarActivity,
    FourStarActivity,
    MainstreamAllocation,
    OutputsRequired,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub field: Field,
    /// Header the column carries after normalization and renaming.
    pub canonical: &'static str,
    /// Header as a person types it into the upload file.
    pub display: &'static str,
    /// Normalized headers accepted for this field, in lookup order.
    pub aliases: &'static [&'static str],
    pub required: bool,
    /// Replace a matched alias with `canonical` in the table header.
    pub rename: bool,
}

pub const COLUMN_SPECS: &[ColumnSpec] = &[
    ColumnSpec {
        field: Field::MainPanel,
        canonical: "main_panel",
        display: "Main panel",
        aliases: &["main_panel"],
        required: false,
        rename: false,
    },
    ColumnSpec {
        field: Field::UnitOfAssessment,
        canonical: "unit_of_assessment",
        display: "Unit of Assessment",
        aliases: &["unit_of_assessment"],
        required: false,
        rename: false,
    },
    ColumnSpec {
        field: Field::SubProfile,
        canonical: "sub_profile",
        display: "Sub-profile",
        aliases: &["sub_profile"],
        required: false,
        rename: false,
    },
    ColumnSpec {
        field: Field::ThreeStarActivity,
        canonical: "percentage_of_activity_rated_3",
        display: "Percentage of activity rated 3*",
        aliases: &[
            "percentage_of_activity_rated_3",
            "percentage_of_research_activity_rated_3",
        ],
        required: true,
        rename: false,
    },
    ColumnSpec {
        field: Field::FourStarActivity,
        canonical: "percentage_of_activity_rated_4",
        display: "Percentage of activity rated 4*",
        aliases: &[
            "percentage_of_activity_rated_4",
            "percentage_of_research_activity_rated_4",
        ],
        required: true,
        rename: false,
    },
    ColumnSpec {
        field: Field::MainstreamAllocation,
        canonical: "mainstream_qr_allocation",
        display: "Mainstream QR allocation",
        aliases: &["mainstream_qr_allocation"],
        required: true,
        rename: false,
    },
    ColumnSpec {
        field: Field::OutputsRequired,
        canonical: "outputs_required",
        display: "Required number of items to be returned for sub-profile",
        aliases: &[
            "outputs_required",
            "required_number_of_items_to_be_returned_for_sub_profile",
        ],
        required: true,
        rename: true,
    },
];

/// Column positions of the four valuation inputs within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub allocation: usize,
    pub outputs_required: usize,
    pub three_star: usize,
    pub four_star: usize,
}

pub fn spec_for(field: Field) -> Option<&'static ColumnSpec> {
    COLUMN_SPECS.iter().find(|spec| spec.field == field)
}

/// Lowercase snake case: case boundaries and runs of anything that is
/// not a letter or digit collapse to a single underscore.
pub fn normalize_column_name(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut output = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                    push_separator(&mut output);
                }
            }
            output.extend(c.to_lowercase());
        } else {
            push_separator(&mut output);
        }
    }

    output.trim_matches('_').to_string()
}

fn push_separator(output: &mut String) {
    if !output.is_empty() && !output.ends_with('_') {
        output.push('_');
    }
}

/// Normalizes every header and keeps them unique: later duplicates get a
/// `_1`, `_2`, ... suffix.
pub fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());

    for (index, header) in headers.iter().enumerate() {
        let mut name = normalize_column_name(header);
        if name.is_empty() {
            name = format!("column_{index}");
        }
        let base = name.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        seen.push(name);
    }

    seen
}

/// Applies the declared renames in place. A rename is skipped when the
/// canonical header is already present.
pub fn apply_renames(headers: &mut [String]) {
    for spec in COLUMN_SPECS.iter().filter(|spec| spec.rename) {
        if headers.iter().any(|header| header == spec.canonical) {
            continue;
        }
        if let Some(header) = headers
            .iter_mut()
            .find(|header| spec.aliases.contains(&header.as_str()))
        {
            debug!(from = %header, to = spec.canonical, "renaming column");
            *header = spec.canonical.to_string();
        }
    }
}

fn find_field(headers: &[String], spec: &ColumnSpec) -> Option<usize> {
    spec.aliases
        .iter()
        .find_map(|alias| headers.iter().position(|header| header == alias))
}

/// Locates every required column, reporting all missing ones at once.
pub fn resolve_columns(headers: &[String]) -> Result<ResolvedColumns, PipelineError> {
    let missing: Vec<String> = COLUMN_SPECS
        .iter()
        .filter(|spec| spec.required && find_field(headers, spec).is_none())
        .map(|spec| spec.display.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }

    let index_of = |field: Field| -> Result<usize, PipelineError> {
        spec_for(field)
            .and_then(|spec| find_field(headers, spec))
            .ok_or_else(|| PipelineError::MissingColumns(vec![format!("{field:?}")]))
    };

    let resolved = ResolvedColumns {
        allocation: index_of(Field::MainstreamAllocation)?,
        outputs_required: index_of(Field::OutputsRequired)?,
        three_star: index_of(Field::ThreeStarActivity)?,
        four_star: index_of(Field::FourStarActivity)?,
    };
    debug!(?resolved, "resolved valuation columns");
    Ok(resolved)
}
