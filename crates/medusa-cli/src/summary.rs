use std::path::Path;

use console::Style;
use medusa_core::band::BandCatalog;
use medusa_core::config::{FrameSourceConfig, MedusaConfig};
use medusa_core::timelapse::{RunOutcome, RunReport};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_run_summary(config: &MedusaConfig) {
    let s = Styles::new();
    let run = &config.run;
    let rig = &config.rig;

    print_title(&s, "MEDUSA Time-lapse");

    // Rig
    println!("  {}", s.header.apply_to("Rig"));
    match rig.serial_port {
        Some(ref port) => println!(
            "    {:<12}{} @ {} baud ({})",
            s.label.apply_to("LEDs"),
            s.path.apply_to(port.display()),
            rig.baud_rate,
            s.method.apply_to(rig.light_mode)
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("LEDs"),
            s.disabled.apply_to("simulated")
        ),
    }
    match rig.source {
        FrameSourceConfig::Simulated => println!(
            "    {:<12}{}",
            s.label.apply_to("Camera"),
            s.disabled.apply_to("simulated")
        ),
        FrameSourceConfig::Replay { ref path } => println!(
            "    {:<12}{}",
            s.label.apply_to("Camera"),
            s.path.apply_to(path.display())
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Resolution"),
        s.value.apply_to(run.capture.resolution)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(rig.output_dir.display())
    );
    println!();

    // Sets
    println!("  {}", s.header.apply_to("Sets"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Count"),
        s.value.apply_to(run.total_sets)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Interval"),
        s.value.apply_to(format!("{}s", run.interval_secs))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bands"),
        s.value.apply_to(run.bands.join(", "))
    );
    if run.pca {
        println!(
            "    {:<12}{}",
            s.label.apply_to("PCA"),
            s.method.apply_to("3 components per set")
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("PCA"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_run_report(report: &RunReport, output_dir: &Path) {
    let s = Styles::new();

    println!();
    let outcome = match report.outcome {
        RunOutcome::Completed => s.method.apply_to("completed"),
        RunOutcome::Cancelled => s.disabled.apply_to("cancelled"),
    };
    println!(
        "  {:<14}{} ({} of {} sets)",
        s.label.apply_to("Run"),
        outcome,
        report.sets_completed,
        report.total_sets
    );
    if let Some(ref reason) = report.pca_skipped {
        println!(
            "  {:<14}{}",
            s.label.apply_to("PCA"),
            s.disabled.apply_to(format!("skipped: {reason}"))
        );
    }
    for (set, reason) in &report.pca_failures {
        println!(
            "  {:<14}{}",
            s.label.apply_to(format!("PCA set {set}")),
            s.disabled.apply_to(reason)
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Images"),
        s.path.apply_to(output_dir.display())
    );
}

pub fn print_band_table(catalog: &BandCatalog) {
    let s = Styles::new();

    print_title(&s, "Bands");
    for band in catalog.bands() {
        let role = if band.is_reference_white {
            s.method.apply_to("white reference")
        } else {
            s.label.apply_to("narrow band")
        };
        println!(
            "  {:>4}  {:<8}{}",
            s.label.apply_to(band.channel),
            s.value.apply_to(&band.label),
            role
        );
    }
    println!();
}
