//! Contact form demo.
//!
//! Mounts the form behind a schema link, fills it from the command line and
//! submits it against a real server:
//!
//! ```text
//! DYNFORM_BASE_URL=http://localhost:3000/ \
//!     contact-form /forms/contact.json email=someone@example.com size=m --submit
//! ```
//!
//! `name=value` sets a text control; `name=value!` checks a radio or checkbox.

use anyhow::{bail, Context};
use dynform::{
    BrowsingContext, Decoration, Decorator, Document, ElementBuilder, FormBuilder, FormConfig,
    FormEnvironment, MountedForm, ReqwestHttpClient, StandardFieldFactory, TracingTelemetry,
};
use dynform_core::environment::SystemClock;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_form=info,dynform=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(href) = args.next() else {
        bail!("usage: contact-form <schema.json> [name=value | name=value!]... [--submit]");
    };
    let rest: Vec<String> = args.collect();
    let submit = rest.iter().any(|a| a == "--submit");

    // Load configuration
    let config = FormConfig::from_env();
    info!(base_url = %config.base_url, "Configuration loaded");

    let http = Arc::new(ReqwestHttpClient::new(config.base_url.clone()));
    let browsing = BrowsingContext::new();
    let environment = FormEnvironment::new(
        http.clone(),
        Arc::new(TracingTelemetry),
        Arc::new(browsing.clone()),
        Arc::new(SystemClock),
        &config,
    );
    let builder = FormBuilder::new(http, Arc::new(StandardFieldFactory::new()), config);
    let decorator = Decorator::new(builder, environment);

    let mut document = Document::new();
    let block = document.insert(
        ElementBuilder::new("div")
            .attr("class", "form")
            .child(ElementBuilder::new("a").attr("href", href.as_str()).text("Contact us")),
    );
    document
        .append_child(document.body(), block)
        .context("mounting the block")?;

    let form = match decorator.decorate(document, block).await {
        Decoration::Mounted(form) => form,
        Decoration::Fallback { document, error } => {
            warn!(%error, "Showing fallback");
            println!("{}", document.inner_html(block));
            return Ok(());
        },
        Decoration::NoTrigger(_) => bail!("'{href}' is not a .json schema link"),
    };

    fill(&form, rest.iter().filter(|a| a.as_str() != "--submit")).await?;
    println!("{}", form.html().await);

    if submit {
        let outcome = form.submit_and_wait().await?;
        info!(?outcome, location = ?browsing.location(), "Submission settled");
    }

    form.store()
        .shutdown(std::time::Duration::from_secs(5))
        .await?;
    Ok(())
}

async fn fill<'a>(form: &MountedForm, inputs: impl Iterator<Item = &'a String>) -> anyhow::Result<()> {
    for input in inputs {
        let Some((name, value)) = input.split_once('=') else {
            bail!("expected name=value, got '{input}'");
        };
        match value.strip_suffix('!') {
            Some(choice) => form.set_checked(name, choice, true).await?,
            None => form.set_value(name, value).await?,
        }
    }
    Ok(())
}
