//! One bulletin run, from dates to files on disk

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;

use crate::assemble::assemble;
use crate::dates::DateRange;
use crate::output::OutputWriter;
use crate::prompts::build_prompt;
use crate::providers::CompletionClient;
use crate::render::{render_png, BrowserEngine, Viewport};
use crate::types::{ModelParams, Variant};

/// Progress of a run. A failure leaves the run at the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    DatesResolved,
    PromptBuilt,
    ResponseReceived,
    HtmlAssembled,
    Rendered,
    FilesWritten,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::DatesResolved => "dates resolved",
            Stage::PromptBuilt => "prompt built",
            Stage::ResponseReceived => "response received",
            Stage::HtmlAssembled => "html assembled",
            Stage::Rendered => "rendered",
            Stage::FilesWritten => "files written",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Paths of a successful run's artifacts
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub report_html: PathBuf,
    pub png: PathBuf,
    pub index_html: PathBuf,
}

pub struct Job<'a, C: ?Sized, E> {
    pub variant: Variant,
    pub params: ModelParams,
    pub viewport: Viewport,
    pub client: &'a C,
    pub engine: &'a E,
    pub output: &'a OutputWriter,
}

impl<'a, C, E> Job<'a, C, E>
where
    C: CompletionClient + ?Sized,
    E: BrowserEngine,
{
    /// Run every stage in order; the first error aborts the run
    pub fn run(&self, dates: DateRange) -> Result<Artifacts> {
        let mut stage = Stage::Init;
        self.run_stages(dates, &mut stage)
            .with_context(|| format!("run failed after stage '{}'", stage))
    }

    fn run_stages(&self, dates: DateRange, stage: &mut Stage) -> Result<Artifacts> {
        advance(stage, Stage::DatesResolved);
        println!(
            "Generating {} bulletin for {} through {}...",
            self.variant,
            dates.short_start(),
            dates.short_end()
        );

        let prompt = build_prompt(self.variant, &dates);
        advance(stage, Stage::PromptBuilt);

        println!(
            "Requesting threats from {} ({})...",
            self.client.provider(),
            self.params.model
        );
        let completion = self.client.complete(&prompt, &self.params)?;
        tracing::debug!("raw completion:\n{}", completion);
        advance(stage, Stage::ResponseReceived);

        let fragment = assemble(self.variant.html_mode(), &completion, &dates)?;
        advance(stage, Stage::HtmlAssembled);

        self.output.prepare()?;
        let report_html = self.output.write_report_html(&fragment)?;

        println!("Rendering PNG...");
        let png = render_png(self.engine, &fragment, &self.viewport)?;
        advance(stage, Stage::Rendered);

        let png = self.output.write_png(&png)?;
        let index_html = self.output.write_index()?;
        advance(stage, Stage::FilesWritten);

        advance(stage, Stage::Done);
        Ok(Artifacts {
            report_html,
            png,
            index_html,
        })
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "stage");
    *stage = next;
}
