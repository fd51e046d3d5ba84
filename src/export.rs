use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::watchlist::{ExportRow, WatchlistStats};

pub const CSV_HEADER: [&str; 10] = [
    "Title",
    "Type",
    "Status",
    "Added Date",
    "Watched Date",
    "Notes",
    "Release Date",
    "Genre",
    "Rating",
    "Overview",
];

pub fn to_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .context("export: write CSV header")?;

    for row in rows {
        let rating = format!("{:.1}", row.rating);
        writer
            .write_record([
                row.title.as_str(),
                row.media_type.as_str(),
                row.status,
                row.added_at.as_str(),
                row.watched_at.as_str(),
                row.notes.as_str(),
                row.release_date.as_str(),
                row.genre.as_str(),
                rating.as_str(),
                row.overview.as_str(),
            ])
            .context("export: write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("export: flush CSV writer: {err}"))?;
    String::from_utf8(bytes).context("export: CSV output not UTF-8")
}

pub fn write_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let contents = to_csv(rows)?;
    fs::write(path, contents)
        .with_context(|| format!("export: write CSV file {}", path.display()))
}

// HTML report for the browser's print-to-PDF flow. Generated entirely from
// the export rows and stats; styling mirrors the in-app palette.
pub fn to_html_report(rows: &[ExportRow], stats: &WatchlistStats) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>My Watchlist Report</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; color: #333; }
        .header { text-align: center; margin-bottom: 30px; }
        .stats { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 30px; }
        .stat-number { font-size: 24px; font-weight: bold; color: #e94560; }
        .stat-label { font-size: 14px; color: #666; }
        .item { border-bottom: 1px solid #eee; padding: 15px 0; }
        .item-title { font-size: 18px; font-weight: bold; margin-bottom: 5px; }
        .item-details { color: #666; font-size: 14px; margin-bottom: 5px; }
        .item-overview { color: #888; font-size: 13px; line-height: 1.4; }
        .status-watched { color: #28a745; font-weight: bold; }
        .status-unwatched { color: #ffc107; font-weight: bold; }
        .genre-item { display: inline-block; background: #e94560; color: white; padding: 5px 10px; margin: 2px; border-radius: 15px; font-size: 12px; }
    </style>
</head>
<body>
"#,
    );

    html.push_str("    <div class=\"header\">\n        <h1>My Watchlist Report</h1>\n");
    html.push_str(&format!(
        "        <p>Generated on {}</p>\n    </div>\n",
        Utc::now().format("%B %-d, %Y")
    ));

    html.push_str("    <div class=\"stats\">\n        <h2>Statistics</h2>\n");
    for (number, label) in [
        (stats.total_items.to_string(), "Total Titles"),
        (stats.watched_items.to_string(), "Watched"),
        (stats.unwatched_items.to_string(), "To Watch"),
        (format!("{:.1}", stats.average_rating), "Avg Rating"),
    ] {
        html.push_str(&format!(
            "        <span class=\"stat-number\">{number}</span> <span class=\"stat-label\">{label}</span>\n"
        ));
    }
    if !stats.top_genres.is_empty() {
        html.push_str("        <h3>Top Genres</h3>\n");
        for (genre, count) in &stats.top_genres {
            html.push_str(&format!(
                "        <span class=\"genre-item\">{} ({count})</span>\n",
                escape(genre)
            ));
        }
    }
    html.push_str("    </div>\n");

    html.push_str(&format!("    <h2>Titles ({})</h2>\n", rows.len()));
    for row in rows {
        let status = if row.status == "Watched" {
            let mut status = "<span class=\"status-watched\">Watched</span>".to_string();
            if !row.watched_at.is_empty() {
                status.push_str(&format!(" on {}", row.watched_at));
            }
            status
        } else {
            "<span class=\"status-unwatched\">To Watch</span>".to_string()
        };

        html.push_str("    <div class=\"item\">\n");
        html.push_str(&format!(
            "        <div class=\"item-title\">{}</div>\n",
            escape(&row.title)
        ));
        html.push_str(&format!(
            "        <div class=\"item-details\">{} &bull; {} &bull; \u{2605} {:.1} &bull; {status}</div>\n",
            escape(&row.release_date),
            escape(&row.genre),
            row.rating
        ));
        if !row.notes.is_empty() {
            html.push_str(&format!(
                "        <div class=\"item-details\"><strong>Notes:</strong> {}</div>\n",
                escape(&row.notes)
            ));
        }
        if !row.overview.is_empty() {
            html.push_str(&format!(
                "        <div class=\"item-overview\">{}</div>\n",
                escape(&row.overview)
            ));
        }
        html.push_str("    </div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn write_html_report(path: &Path, rows: &[ExportRow], stats: &WatchlistStats) -> Result<()> {
    let contents = to_html_report(rows, stats);
    fs::write(path, contents)
        .with_context(|| format!("export: write report file {}", path.display()))
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaType;

    fn sample_row(status: &'static str) -> ExportRow {
        ExportRow {
            title: "Heat".into(),
            media_type: MediaType::Movie,
            status,
            added_at: "2024-01-05".into(),
            watched_at: if status == "Watched" {
                "2024-02-01".into()
            } else {
                String::new()
            },
            notes: "great".into(),
            release_date: "1995-12-15".into(),
            genre: "Crime, Drama".into(),
            rating: 8.3,
            overview: "Two crews collide.".into(),
        }
    }

    #[test]
    fn csv_includes_header_and_rows() {
        let csv = to_csv(&[sample_row("Watched")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Title,Type,Status,Added Date,Watched Date,Notes,Release Date,Genre,Rating,Overview"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Heat"));
        assert!(row.contains("Watched"));
        assert!(row.contains("2024-02-01"));
        assert!(row.contains("great"));
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let csv = to_csv(&[sample_row("Unwatched")]).unwrap();
        assert!(csv.contains("\"Crime, Drama\""));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn report_includes_stats_and_items() {
        let stats = WatchlistStats {
            total_items: 1,
            watched_items: 1,
            unwatched_items: 0,
            average_rating: 8.3,
            top_genres: vec![("Drama".into(), 1)],
        };
        let html = to_html_report(&[sample_row("Watched")], &stats);
        assert!(html.contains("My Watchlist Report"));
        assert!(html.contains("Heat"));
        assert!(html.contains("Watched</span> on 2024-02-01"));
        assert!(html.contains("Drama (1)"));
        assert!(html.contains("<strong>Notes:</strong> great"));
    }

    #[test]
    fn report_escapes_markup_in_titles() {
        let mut row = sample_row("Unwatched");
        row.title = "<script>alert(1)</script>".into();
        let html = to_html_report(&[row], &WatchlistStats::default());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
