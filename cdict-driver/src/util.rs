// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User facing output. Every diagnostic printed by `cdict` goes through the `warning`
//! and `error` functions so they all look alike.

/// Print a warning message. This will add a "warning:" tag before the message and style accordingly.
pub fn warning(msg: &str) {
    let warning = console::style("warning:").bold().yellow();
    let msg_fmt = console::style(msg).bold();
    println!("{warning} {msg_fmt}")
}

/// Print an error message. This will add an "error:" tag before the message and style accordingly.
pub fn error(msg: &str) {
    let error = console::style("error:").bold().red();
    let msg_fmt = console::style(msg).bold();
    println!("{error} {msg_fmt}")
}

/// Print an info message. This will print the stage in bold green and the rest in regular style.
pub fn info_operation(op: &str, msg: &str) {
    let op_fmt = console::style(op).bold().green();
    let msg_fmt = console::style(msg);
    println!("{op_fmt} {msg_fmt}")
}

/// `count` followed by `noun`, pluralized with a trailing `s` unless `count` is one.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 { format!("{count} {noun}") } else { format!("{count} {noun}s") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_plural() {
        assert_eq!(plural(0, "error"), "0 errors");
        assert_eq!(plural(1, "unit"), "1 unit");
        assert_eq!(plural(12, "function"), "12 functions");
    }
}
