/// Dashboard Example
///
/// This example walks the dashboard sections the way a presentation layer
/// would drive the core:
/// - Filling dropdowns with selection_options
/// - Turning widget state into a FilterSelection
/// - Building chart data with build_view
/// - Rendering the empty-result notice

use annexome::{
    build_view, fields, get_dataset, selection_options, Choice, FilterSelection, PriorityRule,
    Result, TopNOptions, TourismMetric, ViewResult, ViewSpec, VisitorBand,
};

fn print_view(title: &str, view: &ViewResult) {
    println!("   {}:", title);
    if let Some(notice) = view.notice() {
        println!("      ({})", notice);
        return;
    }
    match view {
        ViewResult::Bars(bars) => {
            for bar in bars {
                println!("      {:<28} {}", bar.label, bar.value);
            }
        }
        ViewResult::Groups(groups) => {
            for group in groups {
                match &group.sub_key {
                    Some(sub) => println!("      {} / {}: {}", group.key, sub, group.count),
                    None => println!("      {}: {}", group.key, group.count),
                }
            }
        }
        ViewResult::Points(points) => {
            for point in points {
                println!(
                    "      ({:>5}, {:>8}) {}",
                    point.x,
                    point.y,
                    point.hover.as_deref().unwrap_or("")
                );
            }
        }
        ViewResult::Rows(rows) => {
            for record in rows.iter() {
                let values: Vec<String> = record.values().iter().map(|v| v.to_string()).collect();
                println!("      {}", values.join(" | "));
            }
        }
        ViewResult::Summary(summary) => {
            println!(
                "      {} values of {}: total {}, mean {:.1}",
                summary.count,
                summary.field,
                summary.sum,
                summary.mean.unwrap_or(0.0)
            );
        }
    }
}

fn main() -> Result<()> {
    println!("=== Annexome Dashboard Example ===\n");

    // 1. Art forms explorer
    println!("1. Traditional art forms explorer");
    let art = get_dataset("art_forms")?;
    let regions: Vec<String> = selection_options(&art, fields::art_forms::REGION)?
        .iter()
        .map(Choice::to_string)
        .collect();
    println!("   Region dropdown: {}", regions.join(", "));

    let selection = FilterSelection::new()
        .equals(fields::art_forms::REGION, "South")
        .equals(fields::art_forms::CATEGORY, Choice::All)
        .equals(fields::art_forms::PRESERVATION_STATUS, Choice::All);
    let south = selection.apply(&art)?;
    println!("   Showing {} art forms", south.len());

    print_view(
        "Practitioners",
        &build_view(
            &south,
            &ViewSpec::top_n(
                fields::art_forms::ART_FORM,
                fields::art_forms::PRACTITIONERS,
                TopNOptions::default(),
            ),
        )?,
    );
    print_view(
        "By category",
        &build_view(&south, &ViewSpec::grouped_count(fields::art_forms::CATEGORY))?,
    );
    println!();

    // 2. Tourism analytics
    println!("2. Tourism analytics");
    let tourism = get_dataset("tourism")?;
    let metric: TourismMetric = "International".parse()?;
    print_view(
        "International visitors",
        &build_view(
            &tourism,
            &ViewSpec::series(fields::tourism::MONTH, metric.field()),
        )?,
    );
    print_view(
        "Revenue",
        &build_view(&tourism, &ViewSpec::summary(fields::tourism::REVENUE_CRORES))?,
    );
    println!();

    // 3. Hidden gems
    println!("3. Hidden cultural treasures");
    let gems = get_dataset("hidden_gems")?;
    let visible = FilterSelection::new()
        .between(fields::hidden_gems::ACCESSIBILITY_SCORE, 0.0, 10.0)
        .between(fields::hidden_gems::TOURIST_AWARENESS, 0.0, 100.0)
        .apply(&gems)?;
    let mut bubbles = ViewSpec::scatter(
        fields::hidden_gems::ACCESSIBILITY_SCORE,
        fields::hidden_gems::TOURIST_AWARENESS,
    );
    if let ViewSpec::Scatter { size, hover, .. } = &mut bubbles {
        *size = Some(fields::hidden_gems::ANNUAL_VISITORS.to_string());
        *hover = Some(fields::hidden_gems::LOCATION.to_string());
    }
    print_view("Accessibility vs awareness", &build_view(&visible, &bubbles)?);
    print_view(
        "Priority development",
        &build_view(&visible, &ViewSpec::Priority(PriorityRule::hidden_gems()))?,
    );
    println!();

    // 4. Festival calendar
    println!("4. Festival calendar");
    let festivals = get_dataset("festivals")?;
    for band in ["Large (> 75K)", "Small (< 25K)"] {
        let band: VisitorBand = band.parse()?;
        let matched = FilterSelection::new()
            .equals(fields::festivals::MONTH, "All")
            .band(fields::festivals::EXPECTED_VISITORS, band)
            .apply(&festivals)?;
        println!("   Found {} festivals for {:?}", matched.len(), band);
        print_view(
            "Festivals by month",
            &build_view(&matched, &ViewSpec::grouped_count(fields::festivals::MONTH))?,
        );
    }

    let march = FilterSelection::parse("Month == 'Mar'")?.apply(&festivals)?;
    print_view(
        "March festivals",
        &build_view(&march, &ViewSpec::grouped_count(fields::festivals::STATE))?,
    );
    println!();

    // 5. Regional overview
    println!("5. Regional overview");
    let regional = get_dataset("regional")?;
    print_view(
        "Tourist footfall",
        &build_view(
            &regional,
            &ViewSpec::top_n(
                fields::regional::REGION,
                fields::regional::TOURIST_FOOTFALL,
                TopNOptions::default().sorted(fields::regional::TOURIST_FOOTFALL, true),
            ),
        )?,
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
