// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::{style, Term};
use guidesync_config::{default_cache_dir, ConfigFilterCriteria, ConfigRegistry};
use guidesync_core::ServiceType;
use guidesync_guide::{GuideProvider, LocalGuide};
use guidesync_network::ServiceClient;
use guidesync_sync_engine::{
    plan_custom_format_deletion, run_instances, DeleteSelection, ExitStatus, InstanceOutcome,
    InstanceReport, JsonFileCacheStore, RunReport, Transaction,
};
use std::path::PathBuf;

/// Reconcile every selected instance
pub async fn sync(matches: &ArgMatches) -> Result<ExitStatus> {
    let criteria = filter_criteria(matches)?;
    let registry = ConfigRegistry::new().context("Failed to locate the config directory")?;
    let configs = registry
        .find_and_load(&criteria)
        .context("Failed to load configuration")?;

    if configs.is_empty() {
        println!("No instances to process.");
        return Ok(ExitStatus::Success);
    }

    let cache_dir = default_cache_dir().context("Failed to locate the cache directory")?;
    log::debug!(
        "Loaded {} instance(s); cache directory {}",
        configs.len(),
        cache_dir.display()
    );
    let guide_dir = matches
        .get_one::<PathBuf>("guide")
        .cloned()
        .unwrap_or_else(|| cache_dir.join("guide"));
    let guide = open_guide(guide_dir)?;
    let cache = JsonFileCacheStore::new(cache_dir);
    let preview = matches.get_flag("preview");

    if preview {
        println!(
            "{}",
            style("Preview mode: no changes will be made").yellow().bold()
        );
    }

    let report = run_instances(
        &configs,
        |config| ServiceClient::new(config.base_url(), config.api_key()),
        &cache,
        &guide,
        preview,
    )
    .await;

    print_run_report(&report, preview);
    Ok(report.exit_status())
}

/// List guide custom formats
pub fn list_custom_formats(matches: &ArgMatches) -> Result<()> {
    let guide = guide_from_matches(matches)?;
    let services = match matches.get_one::<String>("service") {
        Some(name) => vec![name.parse::<ServiceType>().map_err(|e| anyhow!(e))?],
        None => vec![ServiceType::Radarr, ServiceType::Sonarr],
    };

    for service in services {
        let formats = guide
            .custom_formats(service)
            .with_context(|| format!("Failed to read {} custom formats", service))?;

        println!(
            "\n{} {} Custom Formats",
            style(formats.len()).bold().cyan(),
            service
        );
        println!("{}", "=".repeat(80));

        for cf in formats {
            println!(
                "{}  {} {}",
                style(&cf.trash_id).dim(),
                style(&cf.name).bold(),
                format_score(cf.default_score)
            );
        }
    }

    Ok(())
}

/// List guide release profiles
pub fn list_release_profiles(matches: &ArgMatches) -> Result<()> {
    let guide = guide_from_matches(matches)?;
    let profiles = guide
        .release_profiles()
        .context("Failed to read release profiles")?;

    if profiles.is_empty() {
        println!("No release profiles in the guide.");
        return Ok(());
    }

    println!("\n{} Release Profiles", style(profiles.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for profile in profiles {
        let preferred: usize = profile.preferred.iter().map(|p| p.terms.len()).sum();
        println!(
            "{}  {}",
            style(&profile.trash_id).dim(),
            style(&profile.name).bold()
        );
        println!(
            "  Required: {} | Ignored: {} | Preferred: {}",
            profile.required.len(),
            profile.ignored.len(),
            preferred
        );
    }

    Ok(())
}

/// Load and validate configuration without contacting any service
pub fn validate_config(matches: &ArgMatches) -> Result<()> {
    let criteria = filter_criteria(matches)?;
    let registry = ConfigRegistry::new().context("Failed to locate the config directory")?;
    let configs = registry
        .find_and_load(&criteria)
        .context("Configuration is invalid")?;

    for config in &configs {
        let source = config
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{} {} ({}) {}",
            style("✓").green().bold(),
            config.instance_name(),
            config.service_type(),
            style(source).dim()
        );
    }
    println!("{} instance(s) valid", configs.len());

    Ok(())
}

/// Delete custom formats from one instance by name, or all of them
pub async fn delete_custom_formats(matches: &ArgMatches) -> Result<()> {
    let criteria = filter_criteria(matches)?;
    let registry = ConfigRegistry::new().context("Failed to locate the config directory")?;
    let configs = registry
        .find_and_load(&criteria)
        .context("Failed to load configuration")?;
    let config = configs
        .first()
        .ok_or_else(|| anyhow!("No instance matches {}", criteria.instances.join(", ")))?;
    let instance = config.instance_name();

    let client = ServiceClient::new(config.base_url(), config.api_key())
        .with_context(|| format!("Failed to create a client for {}", instance))?;
    let plan = plan_custom_format_deletion(&client, &delete_selection(matches))
        .await
        .with_context(|| format!("Failed to read custom formats from {}", instance))?;

    for name in &plan.missing {
        println!(
            "{} No custom format named '{}' on {}",
            style("!").yellow(),
            name,
            instance
        );
    }
    if plan.targets.is_empty() {
        println!("No custom formats to delete.");
        return Ok(());
    }

    println!(
        "\n{} custom format(s) on {}:",
        style(plan.targets.len()).bold().cyan(),
        instance
    );
    for record in &plan.targets {
        println!("  - {} (id {})", record.name, record.id);
    }

    if matches.get_flag("preview") {
        println!("{}", style("Preview mode: nothing was deleted").yellow().bold());
        return Ok(());
    }

    if !matches.get_flag("force") && !confirm(&format!("Delete these from {}?", instance))? {
        println!("Nothing deleted.");
        return Ok(());
    }

    let cache_dir = default_cache_dir().context("Failed to locate the cache directory")?;
    let cache = JsonFileCacheStore::new(cache_dir);
    let report = guidesync_sync_engine::delete_custom_formats(&client, &cache, instance, &plan)
        .await
        .with_context(|| format!("Failed to delete custom formats from {}", instance))?;

    println!(
        "{} Deleted {} custom format(s)",
        style("✓").green().bold(),
        report.deleted.len()
    );
    for (name, reason) in &report.rejected {
        println!("{} {}: {}", style("✗").red().bold(), name, reason);
    }
    if !report.rejected.is_empty() {
        bail!(
            "{} custom format(s) could not be deleted",
            report.rejected.len()
        );
    }

    Ok(())
}

fn delete_selection(matches: &ArgMatches) -> DeleteSelection {
    if matches.get_flag("all") {
        return DeleteSelection::All;
    }
    DeleteSelection::Names(
        matches
            .get_many::<String>("names")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!("{} [y/N] ", prompt))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn filter_criteria(matches: &ArgMatches) -> Result<ConfigFilterCriteria> {
    let config_files = matches
        .try_get_many::<PathBuf>("config")
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let instances = matches
        .try_get_many::<String>("instance")
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let service = matches
        .try_get_one::<String>("service")
        .ok()
        .flatten()
        .map(|name| name.parse::<ServiceType>().map_err(|e| anyhow!(e)))
        .transpose()?;

    Ok(ConfigFilterCriteria {
        config_files,
        instances,
        service,
    })
}

fn guide_from_matches(matches: &ArgMatches) -> Result<LocalGuide> {
    let dir = matches
        .get_one::<PathBuf>("guide")
        .cloned()
        .ok_or_else(|| anyhow!("Guide directory is required"))?;
    open_guide(dir)
}

fn open_guide(dir: PathBuf) -> Result<LocalGuide> {
    let guide = LocalGuide::new(dir);
    if !guide.is_available() {
        bail!("Guide data not found at {}", guide.root_path().display());
    }
    Ok(guide)
}

fn print_run_report(report: &RunReport, preview: bool) {
    println!("\n{}", style("Summary").bold().cyan());
    println!("{}", "=".repeat(80));

    for status in report.instances() {
        match &status.outcome {
            InstanceOutcome::Succeeded => {
                println!(
                    "{} {} ({})",
                    style("✓").green().bold(),
                    status.instance,
                    status.service
                );
                if let Some(instance_report) = &status.report {
                    print_instance_report(instance_report, preview);
                }
            }
            InstanceOutcome::Failed(reason) => println!(
                "{} {} ({}): {}",
                style("✗").red().bold(),
                status.instance,
                status.service,
                reason
            ),
        }
    }

    println!(
        "\n{} succeeded, {} failed",
        style(report.succeeded()).green(),
        style(report.failed()).red()
    );
}

fn print_instance_report(report: &InstanceReport, preview: bool) {
    let verb = if preview { "Would" } else { "Did" };
    let set = &report.custom_formats;

    for (label, transactions) in [
        ("create", set.new_records().collect::<Vec<_>>()),
        ("update", set.updated().collect()),
        ("delete", set.deleted().collect()),
    ] {
        if transactions.is_empty() {
            continue;
        }
        println!("  {} {} {} custom format(s):", verb, label, transactions.len());
        for transaction in transactions {
            println!("    - {}", describe(transaction));
        }
    }

    for failure in &set.failures {
        println!(
            "  {} {} ({}): {}",
            style("Skipped").yellow(),
            failure.name,
            failure.key,
            failure.error
        );
    }

    if let Some(applied) = &report.applied {
        println!(
            "  Custom formats: {} created, {} updated, {} deleted, {} unchanged",
            applied.created, applied.updated, applied.deleted, applied.unchanged
        );
    }

    for update in &report.quality_profiles.updated {
        println!(
            "  {} update {} score(s) in quality profile '{}'",
            verb,
            update.changes.len(),
            update.profile
        );
        if preview {
            for change in &update.changes {
                println!(
                    "    - {}: {} -> {}",
                    change.name,
                    format_score(change.from),
                    change.to
                );
            }
        }
    }
    for missing in &report.quality_profiles.missing {
        println!("  {} quality profile '{}' not found", style("!").yellow(), missing);
    }
    for conflict in &report.scores.conflicts {
        println!(
            "  {} {} scored {} and {} in '{}'; kept {}",
            style("!").yellow(),
            conflict.name,
            conflict.kept,
            conflict.rejected,
            conflict.profile,
            conflict.kept
        );
    }

    if let Some(release) = &report.release_profiles {
        for (label, titles) in [
            ("create", &release.created),
            ("update", &release.updated),
            ("delete", &release.deleted),
        ] {
            for title in titles {
                println!("  {} {} release profile: {}", verb, label, title);
            }
        }
        if !release.tags_created.is_empty() {
            println!(
                "  {} create tag(s): {}",
                verb,
                release.tags_created.join(", ")
            );
        }
    }
}

fn describe(transaction: &Transaction) -> String {
    match transaction.remote_id() {
        Some(id) => format!("{} ({}, id {})", transaction.name(), transaction.key(), id),
        None => format!("{} ({})", transaction.name(), transaction.key()),
    }
}

fn format_score(score: Option<i32>) -> String {
    match score {
        Some(score) => format!("[{}]", score),
        None => "[-]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn guide_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let cf_dir = dir.path().join("docs/json/radarr/cf");
        fs::create_dir_all(&cf_dir).unwrap();
        fs::write(
            cf_dir.join("remux.json"),
            r#"{ "trash_id": "a1", "trash_score": 1900, "name": "Remux" }"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("docs/json/sonarr/cf")).unwrap();
        fs::create_dir_all(dir.path().join("docs/json/sonarr/rp")).unwrap();
        dir
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(-10)), "[-10]");
        assert_eq!(format_score(None), "[-]");
    }

    #[test]
    fn test_filter_criteria_collects_repeated_flags() {
        let matches = crate::build_cli()
            .try_get_matches_from([
                "guidesync", "sync", "-c", "a.toml", "--config", "b.toml", "-i", "movies",
            ])
            .unwrap();
        let (_, sync_matches) = matches.subcommand().unwrap();

        let criteria = filter_criteria(sync_matches).unwrap();
        assert_eq!(
            criteria.config_files,
            vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]
        );
        assert_eq!(criteria.instances, vec!["movies".to_string()]);
        assert_eq!(criteria.service, None);
    }

    #[test]
    fn test_sync_service_filter() {
        let matches = crate::build_cli()
            .try_get_matches_from(["guidesync", "sync", "sonarr", "--preview"])
            .unwrap();
        let (_, sync_matches) = matches.subcommand().unwrap();

        let criteria = filter_criteria(sync_matches).unwrap();
        assert_eq!(criteria.service, Some(ServiceType::Sonarr));
        assert!(crate::build_cli()
            .try_get_matches_from(["guidesync", "sync", "lidarr"])
            .is_err());
    }

    fn delete_matches(args: &[&str]) -> Result<ArgMatches, clap::Error> {
        let mut argv = vec!["guidesync", "delete", "custom-formats"];
        argv.extend_from_slice(args);
        let matches = crate::build_cli().try_get_matches_from(argv)?;
        let (_, delete) = matches.subcommand().unwrap();
        let (_, cf) = delete.subcommand().unwrap();
        Ok(cf.clone())
    }

    #[test]
    fn test_delete_by_names_targets_one_instance() {
        let matches = delete_matches(&["movies", "Foo", "Bar Baz", "-p"]).unwrap();

        assert_eq!(
            delete_selection(&matches),
            DeleteSelection::Names(vec!["Foo".to_string(), "Bar Baz".to_string()])
        );
        let criteria = filter_criteria(&matches).unwrap();
        assert_eq!(criteria.instances, vec!["movies".to_string()]);
        assert!(matches.get_flag("preview"));
        assert!(!matches.get_flag("force"));
    }

    #[test]
    fn test_delete_all() {
        let matches = delete_matches(&["movies", "--all", "--force"]).unwrap();
        assert_eq!(delete_selection(&matches), DeleteSelection::All);
        assert!(matches.get_flag("force"));
    }

    #[test]
    fn test_delete_requires_names_or_all() {
        assert!(delete_matches(&["movies"]).is_err());
        assert!(delete_matches(&["movies", "Foo", "--all"]).is_err());
        assert!(delete_matches(&[]).is_err());
    }

    #[test]
    fn test_validate_has_no_instance_filter() {
        let matches = crate::build_cli()
            .try_get_matches_from(["guidesync", "config", "validate", "-c", "a.toml"])
            .unwrap();
        let (_, config_matches) = matches.subcommand().unwrap();
        let (_, validate_matches) = config_matches.subcommand().unwrap();

        let criteria = filter_criteria(validate_matches).unwrap();
        assert_eq!(criteria.config_files.len(), 1);
        assert!(criteria.instances.is_empty());
        assert_eq!(criteria.service, None);
    }

    #[test]
    fn test_list_custom_formats() {
        let dir = guide_dir();
        let guide = dir.path().to_str().unwrap();
        let matches = crate::build_cli()
            .try_get_matches_from(["guidesync", "list", "custom-formats", "--guide", guide])
            .unwrap();
        let (_, list_matches) = matches.subcommand().unwrap();
        let (_, cf_matches) = list_matches.subcommand().unwrap();

        assert!(list_custom_formats(cf_matches).is_ok());
    }

    #[test]
    fn test_list_requires_existing_guide() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(open_guide(missing).is_err());
    }

    #[test]
    fn test_list_rejects_unknown_service() {
        let result = crate::build_cli().try_get_matches_from([
            "guidesync",
            "list",
            "custom-formats",
            "--guide",
            "x",
            "--service",
            "lidarr",
        ]);
        assert!(result.is_err());
    }
}
