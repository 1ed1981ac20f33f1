use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use grape_master::probe::{
    PredictClient, ProbeOutcome, ProxyProbe, list_images,
    network::{endpoint_hints, local_ip},
};
use std::path::{Path, PathBuf};

/// Manual checks against a running grape-master deployment.
#[derive(Debug, Parser)]
#[command(name = "grape-probe", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload one image, or every image in a folder, to the prediction endpoint
    Predict {
        #[arg(required_unless_present = "folder", conflicts_with = "folder")]
        image: Option<PathBuf>,
        #[arg(long)]
        folder: Option<PathBuf>,
        #[arg(long, default_value = "http://127.0.0.1:10000/predict")]
        endpoint: String,
    },
    /// Check the chat proxy's health and generate endpoints
    Proxy {
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        base_url: String,
        #[arg(long, default_value = "Say hello in one sentence")]
        input: String,
    },
    /// Print the URLs mobile clients should use to reach this machine
    Network {
        #[arg(long, default_value_t = 10000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Command::Predict {
            image,
            folder,
            endpoint,
        } => {
            let client = PredictClient::new(endpoint)?;
            match (image, folder) {
                (_, Some(folder)) => predict_folder(&client, &folder).await,
                (Some(image), None) => predict_one(&client, &image).await.map(|_| ()),
                (None, None) => bail!("either an image path or --folder is required"),
            }
        }
        Command::Proxy { base_url, input } => probe_proxy(&base_url, &input).await,
        Command::Network { port } => {
            print_network(port);
            Ok(())
        }
    }
}

async fn predict_one(client: &PredictClient, image: &Path) -> Result<bool> {
    println!("Sending image: {}", image.display());
    println!("Endpoint: {}", client.endpoint());

    match client.predict_file(image).await {
        Ok(ProbeOutcome::Prediction {
            prediction,
            confidence,
        }) => {
            println!("Prediction: {}", prediction);
            println!("Confidence: {:.2}%", confidence * 100.0);
            Ok(true)
        }
        Ok(ProbeOutcome::Rejected { status, body }) => {
            println!("Server returned status {}", status);
            println!("Response: {}", body);
            Ok(false)
        }
        Err(e) => {
            println!("Request failed: {}", e);
            Ok(false)
        }
    }
}

async fn predict_folder(client: &PredictClient, folder: &Path) -> Result<()> {
    let images = list_images(folder)?;
    if images.is_empty() {
        bail!("no image files found in {}", folder.display());
    }

    println!("Found {} images to test\n", images.len());

    let mut succeeded = 0;
    for image in &images {
        if predict_one(client, image).await? {
            succeeded += 1;
        }
        println!();
    }

    println!("Summary: processed {}/{} images", succeeded, images.len());
    Ok(())
}

async fn probe_proxy(base_url: &str, input: &str) -> Result<()> {
    let probe = ProxyProbe::new(base_url)?;

    println!("Health check...");
    match probe.health().await {
        Ok((status, body)) => println!("  {} - {}", status, body),
        Err(e) => println!("  failed: {}", e),
    }

    println!("Generate with 'input' payload...");
    match probe.generate(input).await {
        Ok((status, body)) => {
            let preview: String = body.chars().take(500).collect();
            println!("  {} - {}", status, preview);
        }
        Err(e) => println!("  failed: {}", e),
    }

    Ok(())
}

fn print_network(port: u16) {
    let lan_ip = local_ip();

    for hint in endpoint_hints(port, lan_ip) {
        println!("{}:", hint.target);
        match hint.url {
            Some(url) => println!("  {}", url),
            None => println!("  could not detect a LAN address"),
        }
        println!("  ({})\n", hint.note);
    }
}
