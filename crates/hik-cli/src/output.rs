//! Report formatting.

use crate::orchestrator::{OperationReport, Status};
use crate::OutputFormat;
use anyhow::Result;
use std::io::Write;

/// Print a report to stdout.
pub fn print_report(report: &OperationReport, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    write_report(&mut stdout.lock(), report, format)
}

/// Write a report in the requested format.
pub fn write_report<W: Write>(w: &mut W, report: &OperationReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(w, report),
        OutputFormat::Json => {
            writeln!(w, "{}", serde_json::to_string_pretty(report)?)?;
            Ok(())
        }
    }
}

fn write_text<W: Write>(w: &mut W, report: &OperationReport) -> Result<()> {
    let status = match report.status {
        Status::Ok => "ok",
        Status::Failed => "FAILED",
        Status::NotReady => "not ready",
    };

    writeln!(w, "{} on {} (channel {}): {}", report.operation, report.device, report.channel, status)?;
    if let Some(code) = report.error_code {
        writeln!(w, "  SDK error:  {}", code)?;
    }
    if let Some(path) = &report.path {
        writeln!(w, "  Picture:    {}", path.display())?;
    }
    if let Some(zoom) = report.zoom {
        writeln!(w, "  Zoom:       {:.1}", zoom)?;
    }
    if let Some(info) = &report.device_info {
        writeln!(w, "  Serial:     {}", info.serial)?;
        writeln!(w, "  Type:       {}", info.device_type)?;
        writeln!(w, "  Channels:   {} analog from {}, {} IP", info.analog_channels, info.first_channel, info.ip_channels)?;
        writeln!(w, "  Disks:      {}", info.disks)?;
        writeln!(w, "  Alarm I/O:  {} in, {} out", info.alarm_inputs, info.alarm_outputs)?;
    }
    Ok(())
}
