// Entry point and high-level CLI flow.
//
// - With `--input` the sheet is loaded, analysed and reported in one go.
// - Without it, a small menu mirrors the upload-then-view flow:
//   option [1] loads and analyses a sheet, option [2] renders and exports
//   the reports for the sheet loaded last.
mod config;
mod error;
mod forecast;
mod loader;
mod metrics;
mod normalize;
mod output;
mod pipeline;
mod reports;
mod sequence;
mod staffing;
mod types;
mod util;

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;
use config::Settings;
use log::info;
use once_cell::sync::Lazy;
use pipeline::Analysis;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use types::{RecordRow, SummaryStats};

// The analysis of the sheet loaded last. Loading again replaces it, so no
// derived table ever outlives the upload it came from.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { analysis: None }));

struct AppState {
    analysis: Option<Analysis>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Parser)]
#[command(
    name = "harvest-report",
    version,
    about = "Weekly harvest production, yield forecast and staffing report"
)]
struct Cli {
    /// Harvest sheet exported as CSV. Without it an interactive menu starts.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Show the weekly detail of one variety instead of the top varieties
    #[arg(long)]
    variety: Option<String>,

    /// Rows shown in each console table preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let resp = read_line("Back to Report Selection (Y/N): ").to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Load a sheet and run the whole pipeline over it, printing the load
/// diagnostics.
fn load_and_analyse(path: &Path, settings: &Settings) -> error::Result<Analysis> {
    let (records, load_report) = loader::load_and_clean(path)?;
    for line in load_report.summary_lines(records.len()) {
        println!("{}", line);
    }
    println!();
    Ok(pipeline::analyse(records, settings))
}

/// Handle option [1]: ask for a file, then load and analyse it.
fn handle_load(settings: &Settings) {
    let answer = read_line("Harvest CSV file [harvest.csv]: ");
    let path = if answer.is_empty() {
        PathBuf::from("harvest.csv")
    } else {
        PathBuf::from(answer)
    };
    // Drop the previous upload before reading the next one.
    app_state().analysis = None;
    match load_and_analyse(&path, settings) {
        Ok(analysis) => app_state().analysis = Some(analysis),
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

/// Handle option [2]: render and export every report for the loaded sheet.
fn handle_generate_reports(cli: &Cli, settings: &Settings) {
    let analysis = app_state().analysis.clone();
    let Some(analysis) = analysis else {
        println!("Please load a harvest file first (option 1).\n");
        return;
    };
    if let Err(e) = generate_reports(&analysis, cli, settings) {
        eprintln!("Write error: {}\n", e);
    }
}

/// Print every report and write the matching files into `--out-dir`.
///
/// This function is intentionally side-effectful: it writes the CSV
/// exports and `summary.json`, and prints Markdown previews.
fn generate_reports(a: &Analysis, cli: &Cli, settings: &Settings) -> error::Result<()> {
    let dir = cli.out_dir.as_path();
    std::fs::create_dir_all(dir)?;
    let rows = cli.preview_rows;

    println!("1. Weekly Production Totals\n");
    output::preview_table_rows(&a.weekly_totals, rows);
    output::write_csv(&dir.join("weekly_totals.csv"), &a.weekly_totals)?;

    match cli.variety.as_deref() {
        Some(variety) => {
            println!("2. {} - Actual vs Estimated\n", variety);
            let detail = reports::variety_detail(&a.weekly_variety, variety, settings);
            if detail.is_empty() {
                println!("Variety '{}' not found in the sheet.\n", variety);
            } else {
                output::preview_table_rows(&detail, rows);
                let file = output::variety_file(dir, variety);
                output::write_csv(&file, &detail)?;
                println!("(Full table exported to {})\n", file.display());
            }
        }
        None => {
            println!("2. Top Varieties - Actual vs Estimated\n");
            for variety in &a.top_varieties {
                println!("{}", variety);
                let weekly = reports::weekly_for_varieties(&a.weekly_variety, std::slice::from_ref(variety));
                output::preview_table_rows(&weekly, rows);
            }
            let top = reports::weekly_for_varieties(&a.weekly_variety, &a.top_varieties);
            output::write_csv(&dir.join("top_varieties.csv"), &top)?;
        }
    }
    output::write_csv(&dir.join("weekly_variety.csv"), &a.weekly_variety)?;
    let record_rows: Vec<RecordRow> = a.records.iter().map(RecordRow::from).collect();
    output::write_csv(&dir.join("cleaned_records.csv"), &record_rows)?;

    println!("3. Next-Cycle Coefficient Forecast\n");
    output::preview_table_rows(&a.forecast, a.forecast.len().max(1));
    output::write_csv(&dir.join("forecast.csv"), &a.forecast)?;
    println!("(Full table exported to {})\n", dir.join("forecast.csv").display());

    let next_year = chrono::Local::now().year() + 1;
    println!("4. Staffing Needs {}\n", next_year);
    match &a.staffing {
        Some(s) => {
            println!("Units expected in {}: {}", next_year, util::format_number(s.annual_estimate, 0));
            println!("Harvester days:       {}", util::format_number(s.days_needed, 0));
            println!("Harvesters needed:    {}\n", util::format_number(s.harvesters_needed, 1));
            println!("Sensitivity: harvester output per day\n");
            output::preview_table_rows(&a.sensitivity, a.sensitivity.len().max(1));
            output::write_csv(&dir.join("sensitivity.csv"), &a.sensitivity)?;
            println!("(Full table exported to {})\n", dir.join("sensitivity.csv").display());
        }
        None => println!("Not enough dated records to estimate staffing.\n"),
    }

    let summary: SummaryStats =
        reports::generate_summary(&a.records, &a.weekly_totals, a.est_mean, a.staffing);
    output::write_json(&dir.join("summary.json"), &summary)?;
    info!("Reports written to {}", dir.display());
    Ok(())
}

fn run_menu(cli: &Cli, settings: &Settings) {
    loop {
        println!("Harvest Production Report");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(settings),
            "2" => {
                println!();
                handle_generate_reports(cli, settings);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::default();

    let Some(input) = cli.input.as_deref() else {
        run_menu(&cli, &settings);
        return Ok(());
    };
    let analysis = load_and_analyse(input, &settings)
        .with_context(|| format!("cannot read harvest sheet {}", input.display()))?;
    generate_reports(&analysis, &cli, &settings)
        .with_context(|| format!("cannot write reports to {}", cli.out_dir.display()))?;
    println!("Report complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SHEET: &str = "\
PlantDate,Variety,ProductionNumber,MotherPlants,Total,EstimatedCoefficient
2024-01-01,Rosa,1,100,10,25
2024-01-03,Rosa,1,100,20,25
2024-01-10,Rosa,1,100,30,25
2024-01-02,Lily,,50,5,10
2024-01-09,Lily,,50,6,10
";

    fn analysis(sheet: &str) -> Analysis {
        let (records, _) = loader::load_from_reader(sheet.as_bytes(), "sheet").expect("load");
        pipeline::analyse(records, &Settings::default())
    }

    fn cli(out_dir: &Path, variety: Option<&str>) -> Cli {
        Cli {
            input: None,
            out_dir: out_dir.to_path_buf(),
            variety: variety.map(str::to_string),
            preview_rows: 2,
        }
    }

    fn header(path: &Path) -> String {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("{} not written: {}", path.display(), e));
        text.lines().next().unwrap_or_default().to_string()
    }

    #[test]
    fn generates_every_export_with_top_varieties() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("reports");
        generate_reports(&analysis(SHEET), &cli(&out, None), &Settings::default()).expect("reports");

        assert_eq!(header(&out.join("weekly_totals.csv")), "WeekStart,Total");
        assert_eq!(
            header(&out.join("top_varieties.csv")),
            "WeekStart,Variety,ActualTotal,EstimatedTotal,MeanActualCoefficient,RecordCount,AccuracyRatePct"
        );
        assert_eq!(
            header(&out.join("weekly_variety.csv")),
            "WeekStart,Variety,ActualTotal,EstimatedTotal,MeanActualCoefficient,RecordCount,AccuracyRatePct"
        );
        assert!(header(&out.join("cleaned_records.csv")).starts_with("Variety,ProductionNumber,PlantDate"));
        assert_eq!(header(&out.join("forecast.csv")), "Variety,ForecastPct");
        assert_eq!(header(&out.join("sensitivity.csv")), "DailyOutput,DaysNeeded,HarvestersNeeded");
        assert!(!out.join("variety_Rosa.csv").exists());

        let cleaned = fs::read_to_string(out.join("cleaned_records.csv")).expect("read");
        assert_eq!(cleaned.lines().count(), 6);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("summary.json")).expect("read"))
                .expect("json");
        assert_eq!(summary["total_records"], 5);
        assert_eq!(summary["coefficient_unit"], "percentage");
        assert!(summary["staffing"]["harvesters_needed"].is_number());
    }

    #[test]
    fn variety_option_writes_the_detail_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path();
        generate_reports(&analysis(SHEET), &cli(out, Some("Rosa")), &Settings::default())
            .expect("reports");

        assert_eq!(
            header(&out.join("variety_Rosa.csv")),
            "WeekStart,ActualTotal,EstimatedTotal,MeanActualCoefficient,RollingMeanCoefficient"
        );
        assert!(!out.join("top_varieties.csv").exists());
        assert!(out.join("weekly_variety.csv").exists());
        assert!(out.join("summary.json").exists());
    }

    #[test]
    fn sheet_without_mother_plants_still_writes_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path();
        let sheet = "Variety,Year,Week,Monday,Total\nRosa,2024,2,4,4\n";
        let a = analysis(sheet);
        assert!(a.forecast.is_empty());
        generate_reports(&a, &cli(out, None), &Settings::default()).expect("reports");

        let forecast = fs::read_to_string(out.join("forecast.csv")).expect("read");
        assert_eq!(forecast, "Variety,ForecastPct\n");
        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("summary.json")).expect("read"))
                .expect("json");
        assert!(summary.get("coefficient_unit").is_some());
        assert!(summary.get("staffing").is_some());
    }
}
