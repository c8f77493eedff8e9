use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use report_builder::client::QueryClient;
use report_builder::config::Config;
use report_builder::models::{Operator, ValueClass};
use report_builder::report::{CatalogSource, FilterPatch, FilterValue, ReportSession};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "report-cli")]
#[command(about = "Query the report catalog and preview report configurations", long_about = None)]
struct Cli {
    /// Base URL of the query API (defaults to REPORT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named query and print its rows
    Query {
        /// Query name, e.g. getFiltersForType
        name: String,
        /// Query parameter as key=value
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Build a report configuration against the live catalog and print it
    Preview {
        #[arg(long)]
        analysis_type: String,
        #[arg(long)]
        time_period: Option<String>,
        #[arg(long)]
        attribution_model: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        /// PROPERTY[:OPERATOR][=VALUE[,VALUE...]]
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Property id to segment by
        #[arg(long)]
        segmentation: Option<String>,
        /// Metric id to include
        #[arg(long = "metric")]
        metrics: Vec<String>,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

struct FilterArg {
    property_id: String,
    operator: Option<Operator>,
    value: Option<String>,
}

fn parse_filter(raw: &str) -> FilterArg {
    let (head, value) = match raw.split_once('=') {
        Some((head, value)) => (head, Some(value.to_string())),
        None => (raw, None),
    };
    let (property_id, operator) = match head.split_once(':') {
        Some((id, op)) => (id, Some(Operator::from(op))),
        None => (head, None),
    };

    FilterArg {
        property_id: property_id.to_string(),
        operator,
        value,
    }
}

fn filter_value(operator: &Operator, raw: &str) -> FilterValue {
    match operator.value_class() {
        ValueClass::Set => FilterValue::Set(
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        ValueClass::Scalar => FilterValue::Scalar(raw.to_string()),
        ValueClass::Empty => FilterValue::Empty,
    }
}

#[allow(clippy::too_many_arguments)]
async fn preview(
    source: Arc<dyn CatalogSource>,
    analysis_type: String,
    time_period: Option<String>,
    attribution_model: Option<String>,
    audience: Option<String>,
    filters: Vec<String>,
    segmentation: Option<String>,
    metrics: Vec<String>,
) -> Result<()> {
    let mut session = ReportSession::new();
    session.load_analysis_types(source.as_ref()).await;
    if !session.analysis_types().is_empty()
        && !session.analysis_types().contains(&analysis_type)
    {
        bail!(
            "unknown analysis type '{analysis_type}', expected one of: {}",
            session.analysis_types().join(", ")
        );
    }

    session
        .change_analysis_type(source.as_ref(), analysis_type.as_str())
        .await;

    if let Some(time_period) = time_period {
        session.update(|s| s.set_time_period(time_period))?;
    }
    if let Some(model) = attribution_model {
        session.update(|s| s.set_attribution_model(model))?;
    }
    if let Some(audience) = audience {
        session.update(|s| s.set_audience(audience))?;
    }

    for raw in &filters {
        let arg = parse_filter(raw);
        let property = session
            .catalogs()
            .filters
            .iter()
            .find(|p| p.property_id == arg.property_id)
            .cloned()
            .ok_or_else(|| anyhow!("property '{}' is not filterable for {analysis_type}", arg.property_id))?;

        let id = session.update(|s| s.add_filter(&property))?;
        if let Some(operator) = arg.operator.clone() {
            session.update(|s| s.update_filter(id, FilterPatch::operator(operator)))?;
        }
        if let Some(value) = arg.value.as_deref() {
            let operator = session
                .store()
                .find_filter(id)
                .map(|f| f.operator.clone())
                .context("filter vanished while applying its value")?;
            let value = filter_value(&operator, value);
            session.update(|s| s.update_filter(id, FilterPatch::value(value)))?;
        }
    }

    if let Some(property_id) = segmentation {
        let property = session
            .catalogs()
            .segmentations
            .iter()
            .find(|p| p.property_id == property_id)
            .cloned()
            .ok_or_else(|| anyhow!("property '{property_id}' cannot segment {analysis_type}"))?;
        session.update(|s| s.set_segmentation(Some(property)))?;
    }

    for metric_id in &metrics {
        let metric = session
            .catalogs()
            .metrics
            .iter()
            .find(|m| &m.metric_id == metric_id)
            .cloned()
            .ok_or_else(|| anyhow!("metric '{metric_id}' is not offered for {analysis_type}"))?;
        session.update(|s| s.toggle_metric(&metric))?;
    }

    session.load_value_options(Arc::clone(&source)).await;
    for filter in session.store().filters() {
        let Some(options) = session.value_options(filter.id) else {
            continue;
        };
        if let FilterValue::Set(values) = &filter.value {
            for value in values {
                if !options.is_empty() && !options.iter().any(|o| &o.value == value) {
                    eprintln!(
                        "⚠ '{}' is not a known value of {}",
                        value, filter.property_label
                    );
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.configuration())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api_url = match cli.api_url {
        Some(url) => url,
        None => Config::from_env()?.client.api_url,
    };
    let client = QueryClient::new(&api_url)?;

    match cli.command {
        Commands::Query { name, params } => {
            let rows = client.run(&name, &params).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Preview {
            analysis_type,
            time_period,
            attribution_model,
            audience,
            filters,
            segmentation,
            metrics,
        } => {
            preview(
                Arc::new(client),
                analysis_type,
                time_period,
                attribution_model,
                audience,
                filters,
                segmentation,
                metrics,
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_forms() {
        let arg = parse_filter("1");
        assert_eq!(arg.property_id, "1");
        assert!(arg.operator.is_none() && arg.value.is_none());

        let arg = parse_filter("1=google,direct");
        assert_eq!(arg.value.as_deref(), Some("google,direct"));

        let arg = parse_filter("3:contains=spring");
        assert_eq!(arg.operator, Some(Operator::Contains));
        assert_eq!(arg.value.as_deref(), Some("spring"));
    }

    #[test]
    fn test_filter_value_follows_operator_class() {
        assert_eq!(
            filter_value(&Operator::Equals, "google, direct,"),
            FilterValue::Set(vec!["google".to_string(), "direct".to_string()])
        );
        assert_eq!(
            filter_value(&Operator::Contains, "a,b"),
            FilterValue::Scalar("a,b".to_string())
        );
        assert_eq!(filter_value(&Operator::IsNull, "x"), FilterValue::Empty);
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("analysisType=journeys"),
            Ok(("analysisType".to_string(), "journeys".to_string()))
        );
        assert!(parse_key_val("analysisType").is_err());
    }
}
