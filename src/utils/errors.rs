//! User-Friendly Error Formatting
//!
//! Turns errors from the replay tool into messages with troubleshooting
//! hints for the common failure scenarios.

use std::fmt::Write;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = format!("{:#}", error);

    if error_msg.contains("trace") {
        format_trace_error(&mut output, &error_msg);
    } else if error_msg.contains("lock database") || error_msg.contains("Persistence") {
        format_store_error(&mut output, &error_msg);
    } else if error_msg.contains("config") || error_msg.contains("Config") {
        format_config_error(&mut output, &error_msg);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-lock-compensator -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Inspect learned locks: lamco-lock-compensator --show-database"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_trace_error(output: &mut String, error: &str) {
    writeln!(output, "Trace Replay Error").ok();
    writeln!(output).ok();
    writeln!(output, "The trace file could not be read or parsed.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Wrong path").ok();
    writeln!(output, "     → Check the trace argument points at a file").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Malformed entry").ok();
    writeln!(
        output,
        "     → Each line must be one JSON object with an \"event\" field"
    )
    .ok();
    writeln!(
        output,
        "     → Known events: submit, lock_update, packet, tick, cast_begin,"
    )
    .ok();
    writeln!(output, "       cast_interrupt, combat, anticheat").ok();

    if let Some(line) = error
        .split("line ")
        .nth(1)
        .and_then(|rest| rest.split(|c: char| !c.is_ascii_digit()).next())
        .filter(|digits| !digits.is_empty())
    {
        writeln!(output).ok();
        writeln!(output, "  Offending line: {}", line).ok();
    }
}

fn format_store_error(output: &mut String, _error: &str) {
    writeln!(output, "Lock Database Error").ok();
    writeln!(output).ok();
    writeln!(output, "The learned lock database could not be read or written.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. File is not valid JSON").ok();
    writeln!(output, "     → Move the file aside; it is recreated on save").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Directory not writable").ok();
    writeln!(output, "     → Pass --store with a writable location").ok();
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "The configuration file is invalid.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. TOML syntax error").ok();
    writeln!(output, "     → Check brackets and quoting").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Value out of range").ok();
    writeln!(
        output,
        "     → compensation.removal_percentage must be within 0-100"
    )
    .ok();
    writeln!(
        output,
        "     → compensation.delay_weight must be within (0, 1]"
    )
    .ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Operation Failed").ok();
    writeln!(output).ok();
    writeln!(output, "{}", error).ok();
}
