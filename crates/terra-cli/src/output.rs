//! Rendering of stored countries for stdout.

use std::io::Write;

use terra_core::{Country, RefreshMetadata};

use crate::config::OutputFormat;

/// Writes countries in the requested format.
pub fn write_countries<W: Write>(
    out: &mut W,
    countries: &[Country],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => write_table(out, countries),
        OutputFormat::Json => write_json(out, countries),
        OutputFormat::Jsonl => write_jsonl(out, countries),
        OutputFormat::Csv => write_csv(out, countries),
    }
}

/// JSON Lines: one JSON object per line
fn write_jsonl<W: Write>(out: &mut W, countries: &[Country]) -> anyhow::Result<()> {
    for country in countries {
        writeln!(out, "{}", serde_json::to_string(country)?)?;
    }
    Ok(())
}

fn write_json<W: Write>(out: &mut W, countries: &[Country]) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(countries)?)?;
    Ok(())
}

fn write_csv<W: Write>(out: &mut W, countries: &[Country]) -> anyhow::Result<()> {
    writeln!(
        out,
        "id,name,capital,region,population,currency_code,exchange_rate,estimated_gdp,flag_url,last_refreshed_at"
    )?;

    for c in countries {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            c.id,
            escape_csv(&c.name),
            optional_csv(c.capital.as_deref()),
            optional_csv(c.region.as_deref()),
            c.population,
            optional_csv(c.currency_code.as_deref()),
            c.exchange_rate.map(|r| r.to_string()).unwrap_or_default(),
            c.estimated_gdp.map(|g| g.to_string()).unwrap_or_default(),
            optional_csv(c.flag_url.as_deref()),
            c.last_refreshed_at.format("%Y-%m-%dT%H:%M:%SZ"),
        )?;
    }
    Ok(())
}

fn optional_csv(value: Option<&str>) -> String {
    value.map(escape_csv).unwrap_or_default()
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

const TABLE_HEADERS: [&str; 7] = [
    "NAME",
    "CAPITAL",
    "REGION",
    "POPULATION",
    "CURRENCY",
    "RATE",
    "EST. GDP",
];

fn table_row(c: &Country) -> [String; 7] {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    [
        c.name.clone(),
        or_dash(c.capital.clone()),
        or_dash(c.region.clone()),
        c.population.to_string(),
        or_dash(c.currency_code.clone()),
        or_dash(c.exchange_rate.map(|r| r.to_string())),
        or_dash(c.estimated_gdp.map(|g| g.to_string())),
    ]
}

fn write_table<W: Write>(out: &mut W, countries: &[Country]) -> anyhow::Result<()> {
    if countries.is_empty() {
        writeln!(out, "No countries stored. Run: terra refresh")?;
        return Ok(());
    }

    let rows: Vec<[String; 7]> = countries.iter().map(table_row).collect();
    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
    write_table_line(out, &header, &widths)?;
    for row in &rows {
        write_table_line(out, row, &widths)?;
    }
    writeln!(out, "\n{} countries", rows.len())?;
    Ok(())
}

fn write_table_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            // Numeric columns are right-aligned.
            if i >= 3 && i != 4 {
                format!("{:>width$}", cell, width = width)
            } else {
                format!("{:<width$}", cell, width = width)
            }
        })
        .collect();
    writeln!(out, "{}", line.join("  ").trim_end())?;
    Ok(())
}

/// Writes one country as an aligned key/value block.
pub fn write_country<W: Write>(out: &mut W, c: &Country) -> anyhow::Result<()> {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    writeln!(out, "\n{}\n", c.name)?;
    writeln!(out, "  Capital:           {}", or_dash(c.capital.clone()))?;
    writeln!(out, "  Region:            {}", or_dash(c.region.clone()))?;
    writeln!(out, "  Population:        {}", c.population)?;
    writeln!(out, "  Currency:          {}", or_dash(c.currency_code.clone()))?;
    writeln!(
        out,
        "  Exchange rate:     {}",
        or_dash(c.exchange_rate.map(|r| r.to_string()))
    )?;
    writeln!(
        out,
        "  Estimated GDP:     {}",
        or_dash(c.estimated_gdp.map(|g| g.to_string()))
    )?;
    writeln!(out, "  Flag:              {}", or_dash(c.flag_url.clone()))?;
    writeln!(out, "  Last refreshed:    {}", c.last_refreshed_at)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the refresh metadata.
pub fn write_status<W: Write>(out: &mut W, metadata: &RefreshMetadata) -> anyhow::Result<()> {
    writeln!(out, "\nRefresh Status\n")?;
    writeln!(out, "  Total countries:   {}", metadata.total_countries)?;
    writeln!(out, "  Last refreshed:    {}", metadata.last_refreshed_at)?;
    writeln!(out)?;
    Ok(())
}
