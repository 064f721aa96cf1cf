//! ASCII art banner for interactive mode.

use std::io::IsTerminal;

/// ANSI true-color escape sequences for the banner palette.
struct Colors {
    screen: &'static str,
    play: &'static str,
    antenna: &'static str,
    title: &'static str,
    subtitle: &'static str,
    reset: &'static str,
}

const COLOR: Colors = Colors {
    screen: "\x1b[38;2;88;88;88m",    // Dark gray
    play: "\x1b[38;2;230;33;23m",     // Broadcast red
    antenna: "\x1b[38;2;139;115;85m", // Tan
    title: "\x1b[1;38;2;230;33;23m",  // Bold red
    subtitle: "\x1b[38;2;120;120;140m",
    reset: "\x1b[0m",
};

const PLAIN: Colors = Colors {
    screen: "",
    play: "",
    antenna: "",
    title: "",
    subtitle: "",
    reset: "",
};

/// Prints the streamhost banner to stdout.
///
/// Renders ANSI true-color when stdout is a terminal,
/// falls back to plain text otherwise.
pub fn print_banner() {
    let c = if std::io::stdout().is_terminal() {
        &COLOR
    } else {
        &PLAIN
    };

    let sc = c.screen;
    let pl = c.play;
    let an = c.antenna;
    let tt = c.title;
    let st = c.subtitle;
    let r = c.reset;

    println!(
        r#"
{an}      \    /{r}
{an}       \  /{r}
{sc}  ┌─────────────┐{r}      {tt}     _                            _               _   {r}
{sc}  │    {pl}▶▶{sc}       │{r}      {tt} ___| |_ _ __ ___  __ _ _ __ ___ | |__   ___  ___| |_ {r}
{sc}  │    {pl}▶▶▶▶{sc}     │{r}      {tt}/ __| __| '__/ _ \/ _` | '_ ` _ \| '_ \ / _ \/ __| __|{r}
{sc}  │    {pl}▶▶{sc}       │{r}      {tt}\__ \ |_| | |  __/ (_| | | | | | | | | | (_) \__ \ |_ {r}
{sc}  └─────────────┘{r}      {tt}|___/\__|_|  \___|\__,_|_| |_| |_|_| |_|\___/|___/\__|{r}
{sc}      ┴     ┴{r}
                         {st}"Live around the clock, powered by GitHub Actions"{r}
"#
    );
}
