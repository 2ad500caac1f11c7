//! Self-contained HTML for the PDF report and the delivery email. All
//! survey-authored text passes through `html_escape` before it is embedded.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use surveyscope_core::ScoreRange;
use surveyscope_storage::Respondent;

use crate::config::BrandingConfig;
use crate::results::{SurveyResults, band_description};

const FALLBACK_BAND_COLOR: &str = "#9aa5b1";

/// Accepts hex colors and plain color names; anything else falls back.
fn css_color<'a>(raw: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = raw.trim();
    let is_hex = trimmed
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    let is_name = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_alphabetic());
    if is_hex || is_name { trimmed } else { fallback }
}

fn band_color(band: Option<&ScoreRange>) -> &str {
    band.map_or(FALLBACK_BAND_COLOR, |range| {
        css_color(&range.color, FALLBACK_BAND_COLOR)
    })
}

fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn score_row(out: &mut String, title: &str, percent: f64, band: Option<&ScoreRange>) {
    let width = percent.clamp(0.0, 100.0);
    out.push_str(&format!(
        r#"<tr><td class="label">{title}</td><td class="bar"><div class="fill" style="width:{width:.2}%;background:{color}"></div></td><td class="pct">{pct}</td><td class="band">{desc}</td></tr>"#,
        title = text(title),
        color = attr(band_color(band)),
        pct = format_percent(percent),
        desc = text(band_description(band)),
    ));
}

pub fn render_report_html(
    results: &SurveyResults,
    respondent: &Respondent,
    branding: &BrandingConfig,
) -> String {
    let primary = css_color(&branding.primary_color, "#2f5d8a");
    let mut out = String::with_capacity(4096);

    out.push_str(&format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>{title}</title><style>
body{{font-family:Helvetica,Arial,sans-serif;color:#1f2933;margin:32px}}
header{{border-bottom:4px solid {primary};padding-bottom:12px;margin-bottom:24px}}
header img{{max-height:48px}}
h1{{color:{primary};margin:8px 0 0}}
.total{{font-size:28px;margin:16px 0}}
.total .badge{{display:inline-block;padding:4px 12px;border-radius:4px;color:#fff}}
table{{width:100%;border-collapse:collapse}}
td{{padding:6px 8px;border-bottom:1px solid #e4e7eb;vertical-align:middle}}
td.bar{{width:35%}}
.fill{{height:12px;border-radius:6px}}
td.pct{{text-align:right;white-space:nowrap}}
footer{{margin-top:32px;font-size:11px;color:#7b8794}}
</style></head><body><header>"#,
        title = text(&results.survey_title),
        primary = primary,
    ));

    if let Some(logo) = branding.logo_url.as_deref() {
        out.push_str(&format!(r#"<img src="{}" alt="">"#, attr(logo)));
    }
    out.push_str(&format!(
        "<div>{}</div><h1>{}</h1></header>",
        text(&branding.name),
        text(&results.survey_title)
    ));

    if let Some(name) = respondent.name.as_deref() {
        out.push_str(&format!("<p>Prepared for {}</p>", text(name)));
    }

    out.push_str(&format!(
        r#"<section class="total">Overall score: <strong>{pct}</strong> <span class="badge" style="background:{color}">{desc}</span></section>"#,
        pct = format_percent(results.total_percent),
        color = attr(band_color(results.total_band.as_ref())),
        desc = text(results.total_description()),
    ));

    if branding.show_category_breakdown && !results.categories.is_empty() {
        out.push_str("<h2>By category</h2><table>");
        for category in &results.categories {
            score_row(&mut out, &category.title, category.percent, category.band.as_ref());
        }
        out.push_str("</table>");
    }

    if let Some(footer) = branding.footer.as_deref() {
        out.push_str(&format!("<footer>{}</footer>", text(footer)));
    }
    out.push_str("</body></html>");
    out
}

pub fn render_email_html(
    results: &SurveyResults,
    respondent: &Respondent,
    report_url: &str,
    branding: &BrandingConfig,
) -> String {
    let primary = css_color(&branding.primary_color, "#2f5d8a");
    let greeting = respondent
        .name
        .as_deref()
        .map_or_else(|| "Hello,".to_string(), |name| format!("Hello {},", text(name)));

    format!(
        r#"<!DOCTYPE html><html><body style="font-family:Helvetica,Arial,sans-serif;color:#1f2933">
<p>{greeting}</p>
<p>Thank you for completing <strong>{title}</strong>. Your overall score is {pct}.</p>
<p><a href="{url}" style="display:inline-block;padding:10px 18px;background:{primary};color:#fff;text-decoration:none;border-radius:4px">Download your report</a></p>
<p style="font-size:12px;color:#7b8794">{brand}</p>
</body></html>"#,
        title = text(&results.survey_title),
        pct = format_percent(results.total_percent),
        url = attr(report_url),
        brand = text(&branding.name),
    )
}

pub fn email_subject(results: &SurveyResults) -> String {
    format!("Your {} results", results.survey_title.trim())
}
