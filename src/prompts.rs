//! Prompt text for each bulletin variant

use crate::dates::DateRange;
use crate::types::{ReportPrompt, Variant};

/// States covered by the bulletin
pub const STATES: &[&str] = &["TN", "MS", "GA", "AL", "FL", "NC", "SC"];

/// Inline styling the model-templated variants are asked to reproduce
const HTML_STYLE_GUIDE: &str = r#"Formatting rules:
- Respond with a single HTML fragment only. Do not include <html>, <head>, or <body> tags and do not wrap the answer in code fences.
- Outer wrapper: <div style="background-color:#ffffff; font-family:Arial; color:#333333; font-size:16px; line-height:1.6; padding:24px; margin:0;">
- Headings (h2, h3, h4) use style="color:#990000; font-weight:bold;"
- Use inline styles only. No <style> blocks, scripts, images, or external resources."#;

fn expert_system_prompt(dates: &DateRange) -> String {
    format!(
        "You are a weather expert generating emergency management reports. Today is {}. Always use current dates: {} through {}.",
        dates.long_start(),
        dates.short_start(),
        dates.short_end()
    )
}

fn states_list() -> String {
    STATES.join(", ")
}

/// Build the prompt for a variant. Pure function of the variant and dates.
pub fn build_prompt(variant: Variant, dates: &DateRange) -> ReportPrompt {
    match variant {
        Variant::OpenaiPlain => ReportPrompt {
            system: Some(expert_system_prompt(dates)),
            user: plain_text_prompt(),
        },
        Variant::OpenaiHtml => ReportPrompt {
            system: Some(expert_system_prompt(dates)),
            user: html_bulletin_prompt(dates),
        },
        Variant::ClaudeHtml => ReportPrompt {
            system: None,
            user: format!(
                "{}\n\n{}",
                expert_system_prompt(dates),
                html_bulletin_prompt(dates)
            ),
        },
        Variant::ClaudeSpc => ReportPrompt {
            system: Some(expert_system_prompt(dates)),
            user: spc_bulletin_prompt(dates),
        },
    }
}

fn plain_text_prompt() -> String {
    format!(
        r#"Generate current weather threat information for southeastern US states ({}).

Include any active weather risks like severe thunderstorms, tornadoes, flooding, high winds, or hail.
Format as: Day X: [Risk Level] [Areas] [Hazards] [Timing]

Do not include any dates - just day numbers (Day 1, Day 2, etc.) and weather information.
If no threats exist, state: "No significant weather threats."

Response should be plain text, no HTML."#,
        states_list()
    )
}

fn html_bulletin_prompt(dates: &DateRange) -> String {
    format!(
        r#"Create a 5-day severe weather threat bulletin for southeastern US states ({states}) covering {start} through {end}.

Structure:
1. <h2> with the date range "{start} - {end}"
2. <h3>Severe Weather Threats (5-Day Outlook)</h3> listing each day with threats as "Day N (Weekday, Month D): risk level, affected areas, hazards, timing". Use the real calendar date for each day, starting with {start} as Day 1.
3. <h3>Recommendations</h3> with <h4>Immediate Actions</h4> and <h4>5-Day Monitoring</h4> bullet lists for emergency managers.
4. A closing <p style="font-size:14px; color:#666;"> naming sources: NWS Storm Prediction Center, NOAA, FEMA, and state emergency management agencies.

If no threats exist for a day, say "No significant weather threats."

{style}"#,
        states = states_list(),
        start = dates.short_start(),
        end = dates.short_end(),
        style = HTML_STYLE_GUIDE
    )
}

fn spc_bulletin_prompt(dates: &DateRange) -> String {
    format!(
        r#"Create a 5-day severe weather readiness bulletin for emergency managers in {states}, covering {start} through {end}.

Base the threat assessment on the Storm Prediction Center (SPC) convective outlooks for Days 1-3 and the Day 4-8 probabilistic outlook, along with NWS forecast office discussions for the region.

For each day:
- Label it "Day N (Weekday, Month D)" using the real calendar date, starting with {start} as Day 1.
- Assign a readiness level: ENHANCED, SLIGHT, or MARGINAL. Color the label: ENHANCED #cc0000, SLIGHT #e69500, MARGINAL #2e7d32. Omit the level and state "No significant weather threats." when the SPC shows no severe risk.
- List affected states and areas, primary hazards (tornadoes, damaging winds, hail, flash flooding), and expected timing.

Finish with <h3>Recommendations</h3> (Immediate Actions and 5-Day Monitoring lists, each under an <h4>) and a sources line citing NWS Storm Prediction Center, NOAA, FEMA, and state emergency management agencies in <p style="font-size:14px; color:#666;">.

Start the bulletin with an <h2> reading "{start} - {end}".

{style}"#,
        states = states_list(),
        start = dates.short_start(),
        end = dates.short_end(),
        style = HTML_STYLE_GUIDE
    )
}
