use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::Path;

use atelier_agent::{LlmClient, QuoteOrchestrator};
use atelier_core::{
    Category, DesignField, DesignWizard, FabricSourceType, Length, Neckline, SleeveStyle,
    WizardStep,
};
use tokio::runtime::Runtime;

use crate::commands::{
    encode_swatch, render_appraisal, start_session, submit_with_progress, CommandResult,
};

/// One line of user input, already classified.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Keep,
    Back,
    Quit,
    Value(String),
}

/// Where the user wants to go after answering a step.
#[derive(Debug, PartialEq, Eq)]
enum Nav {
    Next,
    Back,
    Quit,
    Submit,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub completed: usize,
    pub failed: usize,
}

pub fn run() -> CommandResult {
    let session = match start_session("wizard") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome =
        run_session(stdin.lock(), stdout.lock(), &session.orchestrator, &session.runtime);

    match outcome {
        Ok(summary) => CommandResult::success(
            "wizard",
            format!(
                "wizard session ended: {} appraisal(s), {} failed submission(s)",
                summary.completed, summary.failed
            ),
        ),
        Err(error) => CommandResult::failure("wizard", "terminal_io", error.to_string(), 1),
    }
}

/// Drives one interactive session until the user quits or input ends. Each
/// failed submission leaves the design on the final step for another try.
pub fn run_session<R, W, C>(
    input: R,
    output: W,
    orchestrator: &QuoteOrchestrator<C>,
    runtime: &Runtime,
) -> io::Result<SessionSummary>
where
    R: BufRead,
    W: Write,
    C: LlmClient,
{
    let mut prompter = Prompter { input, output };
    let mut wizard = DesignWizard::new();
    let mut summary = SessionSummary::default();

    loop {
        if prompter.walk(&mut wizard)? == Nav::Quit {
            return Ok(summary);
        }

        writeln!(prompter.output, "\nSubmitting design to the atelier...")?;
        prompter.output.flush()?;
        match runtime.block_on(submit_with_progress(orchestrator, &mut wizard, true)) {
            Ok(()) => {
                summary.completed += 1;
                if let Some(appraisal) = wizard.appraisal() {
                    writeln!(prompter.output, "\n{}", render_appraisal(appraisal))?;
                    if appraisal.preview.is_some() {
                        writeln!(
                            prompter.output,
                            "- preview: generated (use `atelier quote --preview-out` to save one)"
                        )?;
                    }
                }

                match prompter.ask("\nStart a new design? [y/N]")? {
                    Answer::Value(reply) if reply.eq_ignore_ascii_case("y") => wizard.reset(),
                    _ => return Ok(summary),
                }
            }
            Err(error) => {
                summary.failed += 1;
                let notice = error.into_interface();
                writeln!(
                    prompter.output,
                    "\n{} (reference: {})",
                    notice.user_message(),
                    notice.correlation_id()
                )?;
            }
        }
    }
}

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Runs steps until the user submits from the final step or quits.
    fn walk(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        loop {
            let step = wizard.step();
            writeln!(self.output, "\nStep {} of 5: {}", step.number(), step.title())?;

            let nav = match step {
                WizardStep::Basis => self.basis(wizard)?,
                WizardStep::Shape => self.shape(wizard)?,
                WizardStep::Artisan => self.artisan(wizard)?,
                WizardStep::Textile => self.textile(wizard)?,
                WizardStep::Finalize => self.finalize(wizard)?,
                WizardStep::Appraisal => return Ok(Nav::Quit),
            };

            match nav {
                Nav::Next => {
                    wizard.advance();
                }
                Nav::Back => {
                    wizard.retreat();
                }
                Nav::Quit | Nav::Submit => return Ok(nav),
            }
        }
    }

    fn basis(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        let current = wizard.config().category;
        match self.choose("Garment category", Category::ALL, Some(current))? {
            Choice::Picked(category) => {
                if category != current {
                    self.apply(wizard.set_category(category))?;
                }
                Ok(Nav::Next)
            }
            Choice::Nav(nav) => Ok(nav),
        }
    }

    fn shape(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        let options = wizard.requirements().silhouettes;
        let current = wizard.config().silhouette;
        match self.choose("Silhouette", options, Some(current))? {
            Choice::Picked(silhouette) => {
                self.apply(wizard.set_field(DesignField::Silhouette(silhouette)))?;
                Ok(Nav::Next)
            }
            Choice::Nav(nav) => Ok(nav),
        }
    }

    fn artisan(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        let requirements = wizard.requirements();

        if requirements.neckline {
            let current = wizard.config().neckline;
            match self.choose("Neckline", Neckline::ALL, current)? {
                Choice::Picked(neckline) => {
                    self.apply(wizard.set_field(DesignField::Neckline(neckline)))?
                }
                Choice::Nav(nav) => return Ok(nav),
            }
        }
        if requirements.sleeve_style {
            let current = wizard.config().sleeve_style;
            match self.choose("Sleeve style", SleeveStyle::ALL, current)? {
                Choice::Picked(sleeve) => {
                    self.apply(wizard.set_field(DesignField::SleeveStyle(sleeve)))?
                }
                Choice::Nav(nav) => return Ok(nav),
            }
        }

        let current = wizard.config().length;
        match self.choose("Length", Length::ALL, Some(current))? {
            Choice::Picked(length) => {
                self.apply(wizard.set_field(DesignField::Length(length)))?;
                Ok(Nav::Next)
            }
            Choice::Nav(nav) => Ok(nav),
        }
    }

    fn textile(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        let current = wizard.config().fabric_source;
        let source = match self.choose("Fabric source", FabricSourceType::ALL, Some(current))? {
            Choice::Picked(source) => source,
            Choice::Nav(nav) => return Ok(nav),
        };
        if source != current {
            self.apply(wizard.set_field(DesignField::FabricSource(source)))?;
        }

        let question = match source {
            FabricSourceType::Description => "Describe the fabric (e.g. silk charmeuse, ivory)",
            FabricSourceType::Link => "Paste a link to the fabric product page",
            FabricSourceType::Upload => "Path to a swatch image",
        };
        loop {
            let held = wizard.config().fabric_data.as_str();
            let shown = match source {
                FabricSourceType::Upload if !held.is_empty() => "<image attached>",
                _ => held,
            };
            let prompt = if shown.is_empty() {
                format!("{question}:")
            } else {
                format!("{question} [{shown}]:")
            };

            let data = match self.ask(&prompt)? {
                Answer::Keep if source == FabricSourceType::Upload && held.is_empty() => {
                    writeln!(self.output, "Attach a swatch image to continue.")?;
                    continue;
                }
                Answer::Keep => return Ok(Nav::Next),
                Answer::Back => return Ok(Nav::Back),
                Answer::Quit => return Ok(Nav::Quit),
                Answer::Value(value) => value,
            };

            let data = match source {
                FabricSourceType::Upload => match encode_swatch(Path::new(&data)) {
                    Ok(encoded) => encoded,
                    Err(error) => {
                        writeln!(self.output, "{error:#}")?;
                        continue;
                    }
                },
                FabricSourceType::Description | FabricSourceType::Link => data,
            };
            self.apply(wizard.set_field(DesignField::FabricData(data)))?;
            return Ok(Nav::Next);
        }
    }

    fn finalize(&mut self, wizard: &mut DesignWizard) -> io::Result<Nav> {
        let notes = wizard.config().additional_notes.clone();
        let prompt = if notes.is_empty() {
            "Additional notes (optional):".to_string()
        } else {
            format!("Additional notes [{notes}]:")
        };
        match self.ask(&prompt)? {
            Answer::Keep => {}
            Answer::Back => return Ok(Nav::Back),
            Answer::Quit => return Ok(Nav::Quit),
            Answer::Value(value) => self.apply(wizard.set_field(DesignField::Notes(value)))?,
        }

        self.summarize(wizard)?;
        match self.ask("Press Enter to request an appraisal, `b` to go back, `q` to quit:")? {
            Answer::Back => Ok(Nav::Back),
            Answer::Quit => Ok(Nav::Quit),
            Answer::Keep | Answer::Value(_) => Ok(Nav::Submit),
        }
    }

    fn summarize(&mut self, wizard: &DesignWizard) -> io::Result<()> {
        let design = wizard.config().normalized();
        writeln!(self.output, "\nYour design:")?;
        writeln!(self.output, "- {} / {}", design.category, design.silhouette)?;
        if let Some(neckline) = design.neckline {
            writeln!(self.output, "- neckline: {neckline}")?;
        }
        if let Some(sleeve) = design.sleeve_style {
            writeln!(self.output, "- sleeves: {sleeve}")?;
        }
        writeln!(self.output, "- length: {}", design.length)?;
        let fabric = match design.fabric_source {
            FabricSourceType::Upload if !design.fabric_data.is_empty() => "<image attached>",
            _ => design.fabric_text().unwrap_or("<none>"),
        };
        writeln!(self.output, "- fabric ({}): {fabric}", design.fabric_source)?;
        if let Some(notes) = design.notes() {
            writeln!(self.output, "- notes: {notes}")?;
        }
        Ok(())
    }

    fn choose<T>(
        &mut self,
        title: &str,
        options: &[T],
        current: Option<T>,
    ) -> io::Result<Choice<T>>
    where
        T: Copy + Display + PartialEq,
    {
        writeln!(self.output, "{title}:")?;
        for (index, option) in options.iter().enumerate() {
            let marker = if current == Some(*option) { " (current)" } else { "" };
            writeln!(self.output, "  {}. {option}{marker}", index + 1)?;
        }

        loop {
            match self.ask("Choose a number, Enter to keep, `b` to go back, `q` to quit:")? {
                Answer::Keep => match current {
                    Some(value) => return Ok(Choice::Picked(value)),
                    None => writeln!(self.output, "Nothing selected yet.")?,
                },
                Answer::Back => return Ok(Choice::Nav(Nav::Back)),
                Answer::Quit => return Ok(Choice::Nav(Nav::Quit)),
                Answer::Value(raw) => match raw.parse::<usize>() {
                    Ok(number) if (1..=options.len()).contains(&number) => {
                        return Ok(Choice::Picked(options[number - 1]));
                    }
                    _ => writeln!(self.output, "Enter a number between 1 and {}.", options.len())?,
                },
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Answer> {
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(Answer::Quit);
        }

        Ok(match line.trim() {
            "" => Answer::Keep,
            "b" | "B" => Answer::Back,
            "q" | "Q" => Answer::Quit,
            value => Answer::Value(value.to_string()),
        })
    }

    /// Wizard rejections are shown and the session carries on.
    fn apply(&mut self, result: Result<(), atelier_core::FlowTransitionError>) -> io::Result<()> {
        if let Err(error) = result {
            writeln!(self.output, "{error}")?;
        }
        Ok(())
    }
}

enum Choice<T> {
    Picked(T),
    Nav(Nav),
}
