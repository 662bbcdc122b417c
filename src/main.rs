// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use rideroad::achievements::{self, AchievementSummary};
use rideroad::stats::{self, format_currency, GarageSummary, GroupStatistics};
use rideroad::{
    inventory_csv, AppConfig, CollectorProfile, Family, GarageStore, OnboardingState,
    ProfileImage, ResetCollaborator, SqliteSettings,
};

const USAGE: &str = "\
Usage: rideroad [command]

Commands:
  (none)                                      Open the garage dashboard
  summary                                     Totals for both families
  achievements                                Milestone progress
  groups <cars|bikes>                         List groups in a family
  new-group <family> <name> <location> [desc] Create an empty group
  import <family> <csv> <group name> <location>
                                              Load a CSV into a new group
  export <family> <csv>                       Write a family's members to CSV
  onboard [name] [age] [vehicle type]         Save profile, finish onboarding
  reset                                       Erase all garage data";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rideroad=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env();

    match args.get(1).map(String::as_str) {
        None => run_ui_mode(&config)?,
        Some("summary") => run_summary(&open_store(&config)?),
        Some("achievements") => run_achievements(&open_store(&config)?),
        Some("groups") => run_groups(&open_store(&config)?, parse_family(args.get(2))?),
        Some("new-group") => run_new_group(&config, &args[2..])?,
        Some("import") => run_import(&config, &args[2..])?,
        Some("export") => run_export(&config, &args[2..])?,
        Some("onboard") => run_onboard(&config, &args[2..])?,
        Some("reset") => run_reset(&config)?,
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Result<GarageStore> {
    config
        .ensure_data_dir()
        .with_context(|| format!("Failed to create {}", config.data_dir().display()))?;

    let settings = SqliteSettings::open(&config.database_path())
        .with_context(|| format!("Failed to open {}", config.database_path().display()))?;

    Ok(GarageStore::open(Box::new(settings)))
}

fn parse_family(arg: Option<&String>) -> Result<Family> {
    let Some(value) = arg else {
        bail!("Missing family (cars or bikes)");
    };
    Family::parse(value).with_context(|| format!("Unknown family '{}' (cars or bikes)", value))
}

fn run_summary(store: &GarageStore) {
    let summary = GarageSummary::compute(store.garage());

    println!("🏁 RideRoad Garage Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for family in Family::ALL {
        let family_stats = match family {
            Family::Cars => &summary.cars,
            Family::Motorcycles => &summary.motorcycles,
        };
        println!("\n{} {}", family_icon(family), family.as_str());
        println!("   Groups:         {}", family_stats.group_count);
        println!("   Vehicles:       {}", family_stats.total_count);
        println!("   Value:          {}", format_currency(family_stats.total_value));
        println!("   Excellent:      {}", family_stats.excellent_count);
        println!("   Avg per group:  {}", family_stats.average_per_group);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Combined vehicles: {}", summary.combined_count);
    println!("✓ Combined value:    {}", format_currency(summary.combined_value));
    println!("✓ Unique types:      {}", summary.unique_types);
}

fn run_achievements(store: &GarageStore) {
    let statuses = achievements::evaluate(store.garage());
    let overall = AchievementSummary::from_statuses(&statuses);

    println!("🏆 Achievements: {}/{} unlocked ({}%)", overall.unlocked, overall.total, overall.percent);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for status in &statuses {
        println!("{} {}", status.rarity.medal(), status.summary());
        println!("     {}", status.description);
    }
}

fn run_groups(store: &GarageStore, family: Family) {
    let groups = store.groups(family);

    println!("{} {} - {} groups", family_icon(family), family.as_str(), groups.len());

    for group in groups {
        let group_stats = GroupStatistics::compute(group);
        println!("\n📁 {} ({})  [{}]", group.name, group.location, group.id);
        if !group.description.is_empty() {
            println!("   {}", group.description);
        }
        println!(
            "   {} vehicles · {} · {} excellent",
            group_stats.total_count,
            format_currency(group_stats.total_value),
            group_stats.excellent_count
        );
        for (tag, count) in stats::type_breakdown(std::slice::from_ref(group)) {
            println!("   {} × {}", tag, count);
        }
    }
}

fn run_new_group(config: &AppConfig, args: &[String]) -> Result<()> {
    if args.len() < 3 {
        bail!("Usage: rideroad new-group <family> <name> <location> [description]");
    }
    let family = parse_family(args.first())?;
    let description = args.get(3).map(String::as_str).unwrap_or("");

    let mut store = open_store(config)?;
    let id = store.create_group(family, args[1].as_str(), args[2].as_str(), description);
    report_write(&store)?;

    println!("✓ Created {} group '{}' [{}]", family.as_str(), args[1], id);
    Ok(())
}

fn run_import(config: &AppConfig, args: &[String]) -> Result<()> {
    if args.len() < 4 {
        bail!("Usage: rideroad import <family> <csv> <group name> <location>");
    }
    let family = parse_family(args.first())?;
    let csv_path = Path::new(&args[1]);

    println!("📂 Loading {}...", csv_path.display());
    let file = File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    let vehicles = inventory_csv::load_members(file, family).context("Failed to read CSV rows")?;
    println!("✓ Loaded {} vehicles", vehicles.len());

    let mut store = open_store(config)?;
    let group_id = store.create_group(family, args[2].as_str(), args[3].as_str(), "");

    let mut added = 0;
    for vehicle in vehicles {
        if store.add_member(family, group_id, vehicle) {
            added += 1;
        }
    }
    report_write(&store)?;

    let group_stats = store
        .get_group(family, group_id)
        .map(GroupStatistics::compute);
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Imported {} vehicles into '{}'", added, args[2]);
    if let Some(stats) = group_stats {
        println!("✓ Group value: {}", format_currency(stats.total_value));
    }

    Ok(())
}

fn run_export(config: &AppConfig, args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("Usage: rideroad export <family> <csv>");
    }
    let family = parse_family(args.first())?;
    let csv_path = Path::new(&args[1]);

    let store = open_store(config)?;
    let file = File::create(csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    let rows = inventory_csv::export_members(family, store.groups(family), file)
        .context("Failed to write CSV rows")?;

    println!("✓ Exported {} {} to {}", rows, family.as_str(), csv_path.display());
    Ok(())
}

fn run_onboard(config: &AppConfig, args: &[String]) -> Result<()> {
    let mut store = open_store(config)?;

    let profile = CollectorProfile {
        name: args.first().cloned(),
        age: args.get(1).cloned(),
        vehicle_type: args.get(2).cloned(),
    };
    profile.save(&mut store.settings_mut())?;
    OnboardingState.complete(&mut store.settings_mut())?;

    let saved = CollectorProfile::load(store.settings())?;
    println!(
        "👋 Welcome, {} ({}, {})",
        saved.display_name(),
        saved.display_age(),
        saved.display_vehicle_type()
    );
    println!("✓ Onboarding completed");
    Ok(())
}

fn run_reset(config: &AppConfig) -> Result<()> {
    let mut store = open_store(config)?;

    let mut onboarding = OnboardingState;
    let mut profile = CollectorProfile::load(store.settings()).unwrap_or_default();
    let mut image = ProfileImage::new(config.profile_image_path());

    let mut collaborators: [&mut dyn ResetCollaborator; 3] =
        [&mut onboarding, &mut profile, &mut image];
    store.clear_all(&mut collaborators);
    report_write(&store)?;

    println!("🧹 Garage reset: all groups, profile and onboarding cleared");
    Ok(())
}

/// Fail the command when the store could not persist the last change
fn report_write(store: &GarageStore) -> Result<()> {
    if let Some(err) = store.last_write_error() {
        bail!("Changes were applied but could not be saved: {}", err);
    }
    Ok(())
}

fn family_icon(family: Family) -> &'static str {
    match family {
        Family::Cars => "🚗",
        Family::Motorcycles => "🏍️",
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🖥️  Loading RideRoad garage...\n");

    let store = open_store(config)?;
    let profile = CollectorProfile::load(store.settings()).unwrap_or_default();

    if !OnboardingState.is_completed(store.settings()) {
        println!("👋 Tip: run `rideroad onboard <name> <age> <vehicle type>` to set up your profile.\n");
    }

    println!(
        "✓ Loaded {} car groups and {} motorcycle groups",
        store.groups(Family::Cars).len(),
        store.groups(Family::Motorcycles).len()
    );
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(store, profile);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin rideroad-server --features server");
    std::process::exit(1);
}
