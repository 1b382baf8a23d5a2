//! Region Admin
//!
//! Operator tool for inspecting and maintaining cloud regions and their
//! availability zones. Every command prints JSON on stdout.

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_regions::{CreateAvailabilityZone, PgRegionRepository, RegionService};
use eyre::{Result, WrapErr};
use migration::Migrator;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "region-admin")]
#[command(about = "Inspect and maintain cloud regions and availability zones")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a region with its provider
    Show { id: Uuid },

    /// Look up a region by code within a provider
    ByCode { provider_id: Uuid, code: String },

    /// List every region of a provider
    List { provider_id: Uuid },

    /// Resolve a region only if it belongs to the customer's provider
    Owned {
        customer_id: Uuid,
        provider_id: Uuid,
        region_id: Uuid,
    },

    /// List regions with at least `min_zones` availability zones
    Valid {
        customer_id: Uuid,
        provider_id: Uuid,
        #[arg(short, long, default_value_t = 1)]
        min_zones: u32,
    },

    /// Create a region from a metadata document, e.g.
    /// '{"name": "US West", "ybImage": "ami-0123", "latitude": 37.4, "longitude": -122.1}'
    Create {
        provider_id: Uuid,
        code: String,
        metadata: String,
    },

    /// Add an availability zone to a region
    AddZone {
        region_id: Uuid,
        code: String,
        name: String,
        #[arg(short, long)]
        subnet: Option<String>,
    },

    /// List the availability zones of a region
    Zones { region_id: Uuid },

    /// Set latitude and longitude
    SetCoordinates {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Set the provider security group id
    SetSecurityGroup { id: Uuid, security_group_id: String },

    /// Merge KEY=VALUE pairs into the region configuration
    SetConfig {
        id: Uuid,
        #[arg(value_parser = parse_key_val, required = true)]
        entries: Vec<(String, String)>,
    },

    /// Print the configuration with sensitive values redacted
    MaskedConfig { id: Uuid },

    /// Deactivate a region and all of its zones atomically
    Disable { id: Uuid },

    /// Apply pending database migrations
    Migrate,

    /// Check database connectivity
    Health,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to database...");
    let db = database::postgres::connect_from_config_with_retry(
        config.database.clone(),
        Some(config.retry.clone()),
    )
    .await
    .wrap_err("Database connection failed")?;

    if let Commands::Migrate = cli.command {
        database::postgres::run_migrations::<Migrator>(&db, "region-admin").await?;
        return print_json(&json!({ "migrated": true }));
    }
    if let Commands::Health = cli.command {
        let status = database::postgres::check_health_detailed(&db).await;
        return print_json(&json!({
            "healthy": status.healthy,
            "latency_ms": status.latency_ms,
            "error": status.error,
        }));
    }

    let service =
        RegionService::new(PgRegionRepository::new(db)).with_masking_policy(config.masking);

    match cli.command {
        Commands::Show { id } => print_json(&service.get_region(id).await?),
        Commands::ByCode { provider_id, code } => {
            print_json(&service.get_region_by_code(provider_id, &code).await?)
        }
        Commands::List { provider_id } => {
            print_json(&service.list_regions_by_provider(provider_id).await?)
        }
        Commands::Owned {
            customer_id,
            provider_id,
            region_id,
        } => print_json(
            &service
                .get_owned_region(customer_id, provider_id, region_id)
                .await?,
        ),
        Commands::Valid {
            customer_id,
            provider_id,
            min_zones,
        } => print_json(
            &service
                .fetch_valid_regions(customer_id, provider_id, min_zones)
                .await?,
        ),
        Commands::Create {
            provider_id,
            code,
            metadata,
        } => {
            let metadata: Value =
                serde_json::from_str(&metadata).wrap_err("metadata is not valid JSON")?;
            print_json(
                &service
                    .create_region_with_metadata(provider_id, &code, metadata)
                    .await?,
            )
        }
        Commands::AddZone {
            region_id,
            code,
            name,
            subnet,
        } => {
            let mut input = CreateAvailabilityZone::new(region_id, code, name);
            if let Some(subnet) = subnet {
                input = input.with_subnet(subnet);
            }
            print_json(&service.add_zone(input).await?)
        }
        Commands::Zones { region_id } => print_json(&service.list_zones(region_id).await?),
        Commands::SetCoordinates {
            id,
            latitude,
            longitude,
        } => print_json(&service.set_coordinates(id, latitude, longitude).await?),
        Commands::SetSecurityGroup {
            id,
            security_group_id,
        } => print_json(&service.set_security_group_id(id, &security_group_id).await?),
        Commands::SetConfig { id, entries } => {
            let updates: BTreeMap<String, String> = entries.into_iter().collect();
            service.update_config(id, updates).await?;
            // never echo raw values
            print_json(&service.masked_config(id).await?)
        }
        Commands::MaskedConfig { id } => print_json(&service.masked_config(id).await?),
        Commands::Disable { id } => {
            let zones = service.disable_region_and_zones(id).await?;
            print_json(&json!({ "region_id": id, "active": false, "zones_disabled": zones }))
        }
        Commands::Migrate | Commands::Health => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("AWS_REGION=us-east-1").unwrap(),
            ("AWS_REGION".to_string(), "us-east-1".to_string())
        );
        assert_eq!(
            parse_key_val("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn test_cli_parses_negative_coordinates() {
        let id = Uuid::now_v7();
        let cli = Cli::try_parse_from([
            "region-admin",
            "set-coordinates",
            &id.to_string(),
            "-33.86",
            "-151.2",
        ])
        .unwrap();

        match cli.command {
            Commands::SetCoordinates {
                latitude,
                longitude,
                ..
            } => {
                assert_eq!(latitude, -33.86);
                assert_eq!(longitude, -151.2);
            }
            _ => panic!("expected set-coordinates"),
        }
    }

    #[test]
    fn test_cli_requires_config_entries() {
        let id = Uuid::now_v7().to_string();
        assert!(Cli::try_parse_from(["region-admin", "set-config", id.as_str()]).is_err());
        assert!(
            Cli::try_parse_from(["region-admin", "set-config", id.as_str(), "A=1", "B=2"]).is_ok()
        );
    }
}
