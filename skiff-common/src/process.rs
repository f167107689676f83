// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Invocation of external tools.

use {
    anyhow::{anyhow, Context, Result},
    duct::Expression,
    log::{debug, warn},
    std::{
        io::{BufRead, BufReader},
        path::PathBuf,
    },
};

/// Run an expression to completion, forwarding its output to the log.
///
/// stderr is merged into stdout and every line is emitted at warn level.
/// Expressions redirecting their own stdout (e.g. via `stdout_path()`)
/// keep that redirection; only their stderr is logged.
///
/// `program` names the tool in error messages.
pub fn run(expression: Expression, program: &str) -> Result<()> {
    debug!("running {}: {:?}", program, expression);

    let reader = expression
        .stderr_to_stdout()
        .unchecked()
        .reader()
        .with_context(|| format!("spawning {}", program))?;
    {
        let lines = BufReader::new(&reader);
        for line in lines.lines() {
            warn!("{}", line?);
        }
    }

    let output = reader
        .try_wait()?
        .ok_or_else(|| anyhow!("unable to wait on {}", program))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(anyhow!("error running {}: {}", program, output.status))
    }
}

/// Run an expression up to `times` times until it succeeds.
///
/// Returns whether any attempt succeeded.
pub fn run_with_retries(expression: &Expression, times: usize) -> bool {
    for attempt in 1..=times {
        match expression
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
        {
            Ok(output) if output.status.success() => return true,
            Ok(output) => {
                warn!(
                    "attempt {} of {} failed ({}): {}",
                    attempt,
                    times,
                    output.status,
                    String::from_utf8_lossy(&output.stdout).trim_end()
                );
            }
            Err(e) => {
                warn!("attempt {} of {} failed: {}", attempt, times, e);
            }
        }
    }

    false
}

/// Resolve an executable on `PATH`.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).with_context(|| format!("unable to find {} on PATH", name))
}
