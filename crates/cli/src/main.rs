use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use rxform_core::{
    DrugOrderElement, EnglishMessages, ExistingOrderPool, FieldKind, FormContext, FormDefinition,
    FormSession, InMemoryCatalog, Mode, Submission,
};
use rxform_types::NonEmptyText;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rxform")]
#[command(about = "Drug order form element CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the element's markup
    Render {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Validate posted values and apply them, printing the outcome as JSON
    Submit {
        #[command(flatten)]
        form: FormArgs,
        /// User submitting the form
        #[arg(long, default_value = "cli")]
        actor: String,
        /// Posted value as field=value, e.g. `--field drug=2 --field startDate=2026-01-05`
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(FieldKind, String)>,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Catalog YAML (drugs and concepts)
    #[arg(long)]
    catalog: PathBuf,
    /// Form definition YAML (name and element parameters)
    #[arg(long)]
    form: PathBuf,
    /// Form mode: enter, edit or view
    #[arg(long, default_value = "enter")]
    mode: Mode,
    /// Patient the form is for; a new one is generated when omitted
    #[arg(long)]
    patient: Option<Uuid>,
    /// Existing orders YAML, bound in edit and view mode; only the patient's orders are used
    #[arg(long, requires = "patient")]
    existing: Option<PathBuf>,
}

struct LoadedForm {
    patient: Uuid,
    definition: FormDefinition,
    element: DrugOrderElement,
    context: FormContext,
}

impl FormArgs {
    fn load(&self) -> anyhow::Result<LoadedForm> {
        let catalog = InMemoryCatalog::load(&self.catalog)
            .with_context(|| format!("loading catalog {}", self.catalog.display()))?;
        let definition = FormDefinition::load(&self.form)
            .with_context(|| format!("loading form {}", self.form.display()))?;

        let patient = self.patient.unwrap_or_else(Uuid::new_v4);
        let mut context = FormContext::new(self.mode, Arc::new(EnglishMessages));
        if let Some(path) = &self.existing {
            let pool = ExistingOrderPool::load(path, patient)
                .with_context(|| format!("loading existing orders {}", path.display()))?;
            context = context.with_existing_orders(pool);
        }

        let element = DrugOrderElement::new(&mut context, &definition.parameters, &catalog)
            .context("configuring drug order element")?;
        Ok(LoadedForm {
            patient,
            definition,
            element,
            context,
        })
    }
}

fn parse_field(raw: &str) -> Result<(FieldKind, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    let kind = name.parse::<FieldKind>().map_err(|e| e.to_string())?;
    Ok((kind, value.to_string()))
}

/// Maps logical field names onto the element's posted field names.
fn build_submission(
    element: &DrugOrderElement,
    context: &FormContext,
    fields: &[(FieldKind, String)],
) -> anyhow::Result<Submission> {
    fields
        .iter()
        .map(|(kind, value)| {
            element
                .field_name(context, *kind)
                .map(|name| (name, value.clone()))
                .with_context(|| format!("field '{kind}' is not part of this form"))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rxform_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { form } => {
            let loaded = form.load()?;
            println!("{}", loaded.element.generate_html(&loaded.context));
        }
        Commands::Submit {
            form,
            actor,
            fields,
        } => {
            let LoadedForm {
                patient,
                definition,
                mut element,
                context,
            } = form.load()?;

            let submission = build_submission(&element, &context, &fields)?;
            let errors = element.validate_submission(&context, &submission);
            if !errors.is_empty() {
                println!("{}", serde_json::to_string_pretty(&errors)?);
                anyhow::bail!("submission has {} validation error(s)", errors.len());
            }

            let actor = NonEmptyText::new(&actor).context("actor cannot be blank")?;
            let mut session = FormSession::new(context, patient, actor, definition.name);
            let outcome = element.handle_submission(&mut session, &submission)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
