//! Turn the model's completion into the bulletin's HTML fragment

use anyhow::Result;
use regex::{Captures, Regex};

use crate::dates::DateRange;
use crate::types::HtmlMode;

/// Assemble the body fragment for the given mode. No sanitization is done;
/// whatever the model produced ends up in the page.
pub fn assemble(mode: HtmlMode, completion: &str, dates: &DateRange) -> Result<String> {
    match mode {
        HtmlMode::SelfTemplated => self_templated(completion, dates),
        HtmlMode::ModelTemplated => Ok(model_templated(completion)),
    }
}

/// Replace each `Day <n>` with a bold label carrying the calendar date.
///
/// Matches whose number can't be mapped to a date are left untouched.
pub fn label_days(text: &str, dates: &DateRange) -> Result<String> {
    let re = Regex::new(r"Day (\d+)")?;
    let labeled = re.replace_all(text, |caps: &Captures| {
        let number = &caps[1];
        match number.parse::<i64>().ok().and_then(|n| dates.day_label(n)) {
            Some(label) => format!("<strong>Day {} ({})</strong>", number, label),
            None => caps[0].to_string(),
        }
    });
    Ok(labeled.into_owned())
}

fn self_templated(completion: &str, dates: &DateRange) -> Result<String> {
    let threats = label_days(completion, dates)?;

    Ok(format!(
        r#"<div style="background-color:#ffffff; font-family:Arial; color:#333333; font-size:16px; line-height:1.6; padding:24px; margin:0;">
<h2 style="color:#990000; font-weight:bold;">{start} - {end}</h2>

<h3 style="color:#990000; font-weight:bold;">Severe Weather Threats (5-Day Outlook)</h3>

<div style="padding: 10px 0;">
{threats}
</div>

<h3 style="color:#990000; font-weight:bold;">Recommendations</h3>
<h4 style="color:#990000; font-weight:bold;">Immediate Actions</h4>
<ul>
<li>Monitor local NWS forecasts and warnings for your specific area</li>
<li>Review emergency plans and communication procedures</li>
<li>Ensure emergency supplies are readily accessible</li>
<li>Stay informed of changing weather conditions</li>
</ul>

<h4 style="color:#990000; font-weight:bold;">5-Day Monitoring</h4>
<ul>
<li>Check weather updates twice daily</li>
<li>Monitor NWS warnings and watches</li>
<li>Be prepared to implement emergency procedures if conditions worsen</li>
<li>Keep communication devices charged and operational</li>
</ul>

<p style="font-size:14px; color:#666;">Sources: NWS Storm Prediction Center, NOAA, FEMA, and state emergency management agencies.</p>
</div>"#,
        start = dates.short_start(),
        end = dates.short_end(),
        threats = threats,
    ))
}

/// Use the model's HTML as-is, minus a surrounding markdown code fence
fn model_templated(completion: &str) -> String {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string ("html") on the opening fence line
    match inner.split_once('\n') {
        Some((info, body)) if !info.contains('<') => body.trim().to_string(),
        _ => inner.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn june_first() -> DateRange {
        DateRange::starting(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap()
    }

    #[test]
    fn test_label_days_scenario() {
        let out = label_days("Day 1: Severe Thunderstorm Risk", &june_first()).unwrap();
        assert_eq!(
            out,
            "<strong>Day 1 (Saturday, June 1)</strong>: Severe Thunderstorm Risk"
        );
    }

    #[test]
    fn test_label_days_every_occurrence() {
        let text = "Day 1: Marginal TN\nDay 3: Flooding GA\nDay 5: Day 5 repeat";
        let out = label_days(text, &june_first()).unwrap();
        assert_eq!(
            out,
            "<strong>Day 1 (Saturday, June 1)</strong>: Marginal TN\n\
             <strong>Day 3 (Monday, June 3)</strong>: Flooding GA\n\
             <strong>Day 5 (Wednesday, June 5)</strong>: <strong>Day 5 (Wednesday, June 5)</strong> repeat"
        );
    }

    #[test]
    fn test_label_days_passes_other_text_through() {
        let text = "No significant weather threats. day 2 Days 3 DAY 4";
        assert_eq!(label_days(text, &june_first()).unwrap(), text);
    }

    #[test]
    fn test_label_days_leaves_unmappable_numbers() {
        let text = "Day 99999999999999999999: nothing";
        assert_eq!(label_days(text, &june_first()).unwrap(), text);
    }

    #[test]
    fn test_self_templated_skeleton() {
        let html = assemble(HtmlMode::SelfTemplated, "Day 2: Hail AL", &june_first()).unwrap();
        assert!(html.starts_with("<div style=\"background-color:#ffffff;"));
        assert!(html.contains(">June 1, 2024 - June 5, 2024</h2>"));
        assert!(html.contains("<strong>Day 2 (Sunday, June 2)</strong>: Hail AL"));
        assert!(html.contains("Immediate Actions"));
        assert!(html.contains("5-Day Monitoring"));
        assert!(html.contains("Sources: NWS Storm Prediction Center"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_model_templated_passthrough() {
        let fragment = "<div><h2>Day 1 stays</h2></div>";
        let html = assemble(HtmlMode::ModelTemplated, fragment, &june_first()).unwrap();
        assert_eq!(html, fragment);
    }

    #[test]
    fn test_model_templated_strips_code_fence() {
        let completion = "```html\n<div>bulletin</div>\n```\n";
        assert_eq!(model_templated(completion), "<div>bulletin</div>");
        assert_eq!(model_templated("```<div>x</div>```"), "<div>x</div>");
    }

    #[test]
    fn test_model_templated_keeps_unbalanced_fence() {
        assert_eq!(model_templated("```html\n<div>"), "```html\n<div>");
    }
}
