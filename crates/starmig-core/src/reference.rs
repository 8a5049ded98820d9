use once_cell::sync::Lazy;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

const JOIN_KEY: &str = "__category_key";

/// Insertion-ordered substitutions from non-canonical to canonical category
/// spellings. Keys and targets are case- and whitespace-normalized at
/// construction, and no target may itself be a key — checked here so the
/// substitution pass stays idempotent.
#[derive(Debug, Clone)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new(pairs: &[(&str, &str)]) -> Result<Self> {
        let entries: Vec<(String, String)> = pairs
            .iter()
            .map(|(alias, canonical)| (normalize_key(alias), normalize_key(canonical)))
            .collect();

        for (_, canonical) in &entries {
            if entries.iter().any(|(alias, _)| alias == canonical) {
                return Err(PipelineError::AliasConflict(canonical.clone()));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Country spellings in the reference extract that differ from the climate
/// dataset's canonical names.
pub static COUNTRY_ALIASES: Lazy<AliasMap> = Lazy::new(|| {
    AliasMap::new(&[
        ("china, prc", "china"),
        ("ivory coast", "côte d'ivoire"),
        (
            "mexico air sea, and not reported (i-94, no land arrivals)",
            "mexico",
        ),
        ("bosnia-herzegovina", "bosnia and herzegovina"),
        ("guinea-bissau", "guinea bissau"),
        ("congo", "congo (democratic republic of the)"),
    ])
    .expect("country alias map is conflict-free")
});

/// Lower-cases and trims a category column for joining.
pub fn canonical_key(column: &str) -> Expr {
    col(column).str().to_lowercase().str().strip_chars(lit(NULL))
}

/// Rewrites every non-canonical spelling to its canonical form, in map order.
pub fn apply_aliases(expr: Expr, aliases: &AliasMap) -> Expr {
    let mut expr = expr;
    for (alias, canonical) in aliases.entries() {
        expr = when(expr.clone().eq(lit(alias.clone())))
            .then(lit(canonical.clone()))
            .otherwise(expr);
    }
    expr
}

/// Left-joins the resolved reference code onto `category`: every input row
/// survives, with a null code where no reference entry matches. Both join
/// keys are canonicalized and alias-substituted first; the category column is
/// title-cased afterwards for presentation.
pub fn resolve_reference(
    lf: LazyFrame,
    category: &str,
    codes: LazyFrame,
    code_category: &str,
    code_column: &str,
    aliases: &AliasMap,
) -> LazyFrame {
    let lookup = codes.select([
        apply_aliases(canonical_key(code_category), aliases).alias(JOIN_KEY),
        col(code_column),
    ]);

    lf.with_column(apply_aliases(canonical_key(category), aliases).alias(JOIN_KEY))
        .join(
            lookup,
            [col(JOIN_KEY)],
            [col(JOIN_KEY)],
            JoinArgs::new(JoinType::Left),
        )
        .select([col("*").exclude([JOIN_KEY])])
        .with_column(title_case_expr(category))
}

/// Title-cases a string column: whitespace-delimited words, first letter
/// upper-cased, the rest lowered.
pub fn title_case_expr(column: &str) -> Expr {
    col(column).map(
        |values| {
            let name = values.name().clone();
            let ca = values.str()?;
            let cased: StringChunked = ca.iter().map(|value| value.map(title_case)).collect();
            let mut series = cased.into_series();
            series.rename(name);
            Ok(Some(series.into()))
        },
        GetOutput::same_type(),
    )
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for ch in value.chars() {
        if ch.is_whitespace() {
            word_start = true;
            out.push(ch);
        } else if word_start {
            out.extend(ch.to_uppercase());
            word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
