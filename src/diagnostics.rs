use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

fn render_configuration_missing() -> String {
    return "\
# Error: Environment Directory Not Set

The document uses `#Include` or `#FFFile`, which resolve relative to the
PMD environment directory, and none is configured.

## Fix

Point pmdref at your PMD batch file in `.pmdref.toml`:

    batch_path = \"C:/PMD/MC.BAT\"

or pass the directory directly:

    pmdref --env-dir C:/PMD hover song.mml 10 4
"
    .to_string();
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigurationMissing => render_configuration_missing(),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::MalformedToken { token } => format!("\
# Error: Malformed Token

`{token}` is not a decimal or `$`-hex numeral that fits in 32 bits.
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.pmdref.toml`.
"),
        Error::Unreadable { path, source } => format!("\
# Error: Unreadable Document

`{}` could not be read: {source}
", path.display()),
    };
}
