use crate::config::DetailConfig;
use crate::model::Detail;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Label synonyms per semantic field. Sources phrase the same field many
/// ways; a cell whose text contains any synonym counts as that field's
/// label.
const ELIGIBILITY_LABELS: &[&str] = &["지원대상", "신청대상", "지원자격", "신청자격", "대상"];
const CONTENT_LABELS: &[&str] = &["지원내용", "사업내용", "사업개요", "지원사항", "내용"];
const PERIOD_LABELS: &[&str] = &["신청기간", "접수기간", "모집기간", "신청 기간", "접수 기간", "기간"];
const AMOUNT_LABELS: &[&str] = &["지원금액", "지원규모", "사업규모", "지원 금액", "금액", "규모"];

const PERIOD_START_LABELS: &[&str] = &["접수시작", "접수 시작", "신청시작", "시작일"];
const PERIOD_END_LABELS: &[&str] = &["접수마감", "접수 마감", "신청마감", "마감일", "종료일"];

/// Values a source prints where it has nothing to say.
const JUNK_VALUES: &[&str] = &["-", "없음", "해당없음", "해당 없음"];

/// Below this many characters a value carries no information.
const MIN_FIELD_CHARS: usize = 2;

/// Plausibility bounds for the label-plus-sibling strategy, which pairs
/// loose elements and is the most prone to grabbing the wrong node.
const SIBLING_MIN_CHARS: usize = 4;
const SIBLING_MAX_CHARS: usize = 400;

/// Containers scanned, in order, when no labeled content block was found.
const DEFAULT_CONTENT_CONTAINERS: &[&str] = &[
    ".view_cont",
    ".board_view",
    ".bbs_view",
    "#contents",
    ".content",
    "article",
    ".view",
];

/// Per-source knobs for detail extraction.
#[derive(Debug, Clone)]
pub struct ExtractProfile {
    content_containers: Vec<String>,
}

impl ExtractProfile {
    pub fn from_config(detail: &DetailConfig) -> Self {
        let content_containers = if detail.content_containers.is_empty() {
            DEFAULT_CONTENT_CONTAINERS
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        } else {
            detail.content_containers.clone()
        };
        Self { content_containers }
    }
}

impl Default for ExtractProfile {
    fn default() -> Self {
        Self::from_config(&DetailConfig::default())
    }
}

/// Runs the cascading extraction for all four semantic fields over one
/// detail document. Pure; caching and fetching are the pipeline's job.
pub fn extract_detail(doc: &Html, profile: &ExtractProfile) -> Detail {
    let eligibility = extract_field(doc, "eligibility", ELIGIBILITY_LABELS);
    let mut content = extract_field(doc, "content", CONTENT_LABELS);
    let mut period = extract_field(doc, "period", PERIOD_LABELS);
    let amount = extract_field(doc, "amount", AMOUNT_LABELS);

    // Source-specific composition fallback: separate start/end labels.
    if period.is_none() {
        period = compose_period(doc);
    }
    // Global fallback: any date range in the visible text.
    if period.is_none() {
        period = scan_text_for_date_range(doc);
    }
    // Global fallback: known body containers.
    if content.is_none() {
        content = scan_content_containers(doc, profile);
    }

    Detail {
        eligibility,
        content,
        period,
        amount,
    }
}

type Strategy = fn(&Html, &[&str]) -> Option<String>;

/// Ordered, first-accepted-match-wins. Each strategy only returns values
/// that already passed `accept`; a rejected candidate falls through both
/// within and across strategies.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("header_value_row", header_value_row),
    ("plain_columns", plain_columns),
    ("definition_pair", definition_pair),
    ("label_sibling", label_sibling),
];

fn extract_field(doc: &Html, field: &str, labels: &[&str]) -> Option<String> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(doc, labels) {
            trace!(field, strategy = name, "field extracted");
            return Some(value);
        }
    }
    None
}

/// Strategy 1: a header cell (`th`) containing a synonym labels the next
/// non-header cell in the same row. Skipping further header cells supports
/// header-value-header-value row layouts.
fn header_value_row(doc: &Html, labels: &[&str]) -> Option<String> {
    let row_sel = selector("tr");
    let cell_sel = selector("th, td");

    for row in doc.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        for (index, cell) in cells.iter().enumerate() {
            if !is_header_cell(cell) || !contains_any(&element_text(*cell), labels) {
                continue;
            }
            let value_cell = cells[index + 1..].iter().find(|c| !is_header_cell(c));
            if let Some(value_cell) = value_cell
                && let Some(value) = accept(&element_text(*value_cell), labels)
            {
                return Some(value);
            }
        }
    }

    None
}

/// Strategy 2: header-less rows of plain `td` cells. The first cell labels
/// the second; in four-column layouts the third labels the fourth.
fn plain_columns(doc: &Html, labels: &[&str]) -> Option<String> {
    let row_sel = selector("tr");
    let td_sel = selector("td");
    let th_sel = selector("th");

    for row in doc.select(&row_sel) {
        if row.select(&th_sel).next().is_some() {
            continue;
        }
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();

        for (label_idx, value_idx) in [(0usize, 1usize), (2, 3)] {
            let (Some(label_cell), Some(value_cell)) = (cells.get(label_idx), cells.get(value_idx))
            else {
                continue;
            };
            if contains_any(&element_text(*label_cell), labels)
                && let Some(value) = accept(&element_text(*value_cell), labels)
            {
                return Some(value);
            }
        }
    }

    None
}

/// Strategy 3: a `dt` containing a synonym paired with the immediately
/// following `dd`.
fn definition_pair(doc: &Html, labels: &[&str]) -> Option<String> {
    let dt_sel = selector("dt");

    for dt in doc.select(&dt_sel) {
        if !contains_any(&element_text(dt), labels) {
            continue;
        }
        let next = dt.next_siblings().filter_map(ElementRef::wrap).next();
        if let Some(next) = next
            && next.value().name() == "dd"
            && let Some(value) = accept(&element_text(next), labels)
        {
            return Some(value);
        }
    }

    None
}

/// Strategy 4: any element styled like a label or heading, paired with its
/// next sibling's text. Plausibility-bounded because this pairing is loose.
fn label_sibling(doc: &Html, labels: &[&str]) -> Option<String> {
    let candidate_sel = selector("div, p, span, strong, b, h3, h4, h5, li, em");

    for el in doc.select(&candidate_sel) {
        if !is_label_like(&el) {
            continue;
        }
        let label_text = element_text(el);
        if label_text.chars().count() > 30 || !contains_any(&label_text, labels) {
            continue;
        }

        let Some(sibling) = el.next_siblings().filter_map(ElementRef::wrap).next() else {
            continue;
        };
        let value = element_text(sibling);
        let len = value.chars().count();
        if !(SIBLING_MIN_CHARS..=SIBLING_MAX_CHARS).contains(&len) {
            continue;
        }
        if let Some(value) = accept(&value, labels) {
            return Some(value);
        }
    }

    None
}

/// Separate start-date and end-date labels concatenated into one range.
fn compose_period(doc: &Html) -> Option<String> {
    let start = extract_field(doc, "period_start", PERIOD_START_LABELS)?;
    let end = extract_field(doc, "period_end", PERIOD_END_LABELS)?;
    Some(format!("{start} ~ {end}"))
}

fn scan_text_for_date_range(doc: &Html) -> Option<String> {
    let date = r"\d{4}\s*[.\-/년]\s*\d{1,2}\s*[.\-/월]\s*\d{1,2}\s*일?\.?";
    let range = Regex::new(&format!(r"({date}\s*[~∼〜-]\s*{date})"))
        .expect("date range regex must compile");

    let text = document_text(doc);
    range
        .find(&text)
        .map(|m| collapse_whitespace(m.as_str()))
}

fn scan_content_containers(doc: &Html, profile: &ExtractProfile) -> Option<String> {
    for css in &profile.content_containers {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next()
            && let Some(value) = accept(&element_text(el), CONTENT_LABELS)
        {
            trace!(container = %css, "content taken from fallback container");
            return Some(value);
        }
    }
    None
}

/// Gatekeeper between strategies and the final field value. Junk and
/// echoed-back headers fall through to the next strategy.
fn accept(candidate: &str, labels: &[&str]) -> Option<String> {
    let value = collapse_whitespace(candidate);
    if value.chars().count() < MIN_FIELD_CHARS {
        return None;
    }
    if JUNK_VALUES.contains(&value.as_str()) {
        return None;
    }
    if labels.iter().any(|label| value == *label) {
        return None;
    }
    Some(value)
}

fn contains_any(text: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| text.contains(label))
}

fn is_header_cell(cell: &ElementRef<'_>) -> bool {
    cell.value().name() == "th"
}

fn is_label_like(el: &ElementRef<'_>) -> bool {
    match el.value().name() {
        "strong" | "b" | "h3" | "h4" | "h5" => true,
        _ => el
            .value()
            .attr("class")
            .is_some_and(|class| {
                ["tit", "label", "head", "subject", "th"]
                    .iter()
                    .any(|hint| class.contains(hint))
            }),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn document_text(doc: &Html) -> String {
    collapse_whitespace(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}
