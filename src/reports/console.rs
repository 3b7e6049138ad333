use crate::Result;
use crate::metadata::stats::{self, RelativeAge};
use crate::metadata::{AggregateProjectMetadata, Completeness, Readiness, Section, StatsComputer, UnavailableReason};
use chrono::{DateTime, Utc};
use core::fmt::Write;
use owo_colors::OwoColorize;
use scraper::{ElementRef, Html};

const MAX_CONTRIBUTORS_SHOWN: usize = 10;
const MAX_README_LINES: usize = 12;
const SHORT_SHA_LEN: usize = 7;

/// Render the line naming the repository, or a notice when there is none.
pub fn generate_header<W: Write>(aggregate: &AggregateProjectMetadata, use_colors: bool, writer: &mut W) -> Result<()> {
    match &aggregate.reference {
        Some(reference) => {
            let name = reference.to_string();
            if use_colors {
                writeln!(writer, "{}", name.bold())?;
            } else {
                writeln!(writer, "{name}")?;
            }
        }
        None => writeln!(writer, "No repository data available")?,
    }

    Ok(())
}

/// Render one section in its current state.
pub fn generate_section<W: Write>(
    aggregate: &AggregateProjectMetadata,
    section: Section,
    stats: &mut StatsComputer,
    now: DateTime<Utc>,
    use_colors: bool,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer)?;
    let title = section_title(section);
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }

    match aggregate.readiness.get(section) {
        Readiness::Pending => writeln!(writer, "  loading...")?,
        Readiness::Unavailable(reason) => {
            let text = unavailable_text(reason);
            if use_colors {
                writeln!(writer, "  {}", text.dimmed())?;
            } else {
                writeln!(writer, "  {text}")?;
            }
        }
        Readiness::Ready => match section {
            Section::Summary => write_summary(aggregate, now, use_colors, writer)?,
            Section::Languages => write_languages(aggregate, stats, use_colors, writer)?,
            Section::Commits => write_commits(aggregate, now, use_colors, writer)?,
            Section::Readme => write_readme(aggregate, writer)?,
            Section::Contributors => write_contributors(aggregate, use_colors, writer)?,
        },
    }

    Ok(())
}

const fn section_title(section: Section) -> &'static str {
    match section {
        Section::Summary => "Summary",
        Section::Languages => "Languages",
        Section::Commits => "Recent commits",
        Section::Readme => "README",
        Section::Contributors => "Contributors",
    }
}

const fn unavailable_text(reason: UnavailableReason) -> &'static str {
    match reason {
        UnavailableReason::NotFound | UnavailableReason::NoReference => "no data",
        UnavailableReason::RateLimited => "unavailable (rate limited)",
        UnavailableReason::TransportError => "unavailable (request failed)",
        UnavailableReason::DependencyUnavailable => "unavailable (repository summary unavailable)",
    }
}

fn write_summary<W: Write>(aggregate: &AggregateProjectMetadata, now: DateTime<Utc>, use_colors: bool, writer: &mut W) -> Result<()> {
    let Some(summary) = &aggregate.summary else {
        writeln!(writer, "  no data")?;
        return Ok(());
    };

    if let Some(description) = &summary.description {
        writeln!(writer, "  {description}")?;
    }

    if use_colors {
        writeln!(writer, "  {}", summary.web_url.underline())?;
    } else {
        writeln!(writer, "  {}", summary.web_url)?;
    }

    writeln!(
        writer,
        "  Stars: {}  Forks: {}  Open issues: {}",
        summary.star_count, summary.fork_count, summary.open_issue_count
    )?;

    if let Some(pushed_at) = summary.last_pushed_at {
        writeln!(writer, "  Last push: {}", RelativeAge::between(pushed_at, now))?;
    }

    if !summary.topics.is_empty() {
        writeln!(writer, "  Topics: {}", summary.topics.join(", "))?;
    }

    Ok(())
}

fn write_languages<W: Write>(aggregate: &AggregateProjectMetadata, stats: &mut StatsComputer, use_colors: bool, writer: &mut W) -> Result<()> {
    let percentages = stats::percentages(&aggregate.languages);
    if percentages.is_empty() {
        writeln!(writer, "  no data")?;
        return Ok(());
    }

    let ordered: Vec<_> = aggregate.languages.by_size().into_iter().filter(|&(_, bytes)| bytes > 0).collect();
    let width = ordered.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, _) in ordered {
        let pct = percentages.get(name).copied().unwrap_or_default();
        let color = stats.color_for(name);
        if use_colors {
            writeln!(
                writer,
                "  {} {name:<width$} {pct:>5.1}%",
                "■".truecolor(color.red, color.green, color.blue)
            )?;
        } else {
            writeln!(writer, "  {name:<width$} {pct:>5.1}%")?;
        }
    }

    Ok(())
}

fn write_commits<W: Write>(aggregate: &AggregateProjectMetadata, now: DateTime<Utc>, use_colors: bool, writer: &mut W) -> Result<()> {
    if aggregate.commits.is_empty() {
        writeln!(writer, "  no data")?;
        return Ok(());
    }

    for commit in &aggregate.commits {
        let sha = commit.id.get(..SHORT_SHA_LEN).unwrap_or(&commit.id);
        let age = RelativeAge::between(commit.authored_at, now);
        if use_colors {
            writeln!(writer, "  {} {} ({}, {age})", sha.yellow(), commit.headline(), commit.author_name.cyan())?;
        } else {
            writeln!(writer, "  {sha} {} ({}, {age})", commit.headline(), commit.author_name)?;
        }
    }

    Ok(())
}

fn write_contributors<W: Write>(aggregate: &AggregateProjectMetadata, use_colors: bool, writer: &mut W) -> Result<()> {
    let contributors = &aggregate.contributors;
    let noun = if contributors.len() == 1 { "contributor" } else { "contributors" };
    writeln!(writer, "  {} {noun}", contributors.len())?;

    match aggregate.contributors_completeness {
        Completeness::Complete => {}
        Completeness::Partial => writeln!(writer, "  (partial list, loading was interrupted)")?,
        Completeness::Truncated => writeln!(writer, "  (list truncated at the configured limit)")?,
    }

    let shown = &contributors[..contributors.len().min(MAX_CONTRIBUTORS_SHOWN)];
    let width = shown.iter().map(|c| c.handle.len()).max().unwrap_or(0);
    for contributor in shown {
        if use_colors {
            writeln!(
                writer,
                "  {:<width$} {}",
                contributor.handle.green(),
                contributor.contribution_count
            )?;
        } else {
            writeln!(writer, "  {:<width$} {}", contributor.handle, contributor.contribution_count)?;
        }
    }

    if contributors.len() > shown.len() {
        writeln!(writer, "  ... and {} more", contributors.len() - shown.len())?;
    }

    Ok(())
}

fn write_readme<W: Write>(aggregate: &AggregateProjectMetadata, writer: &mut W) -> Result<()> {
    let Some(html) = &aggregate.readme_html else {
        writeln!(writer, "  no data")?;
        return Ok(());
    };

    let text = strip_markup(html);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        writeln!(writer, "  no data")?;
        return Ok(());
    }

    for line in lines.iter().take(MAX_README_LINES) {
        writeln!(writer, "  {line}")?;
    }

    if lines.len() > MAX_README_LINES {
        writeln!(writer, "  ...")?;
    }

    Ok(())
}

/// Reduce rendered HTML to its text, one block element per line.
///
/// Entities are decoded once by the parser. Script and style contents are dropped.
fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, text: &mut String) {
    let name = element.value().name();
    if matches!(name, "script" | "style") {
        return;
    }

    let block = matches!(name, "p" | "br" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "div" | "pre" | "tr");
    if block {
        text.push('\n');
    }

    for child in element.children() {
        if let Some(run) = child.value().as_text() {
            text.push_str(run);
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_text(child, text);
        }
    }

    if block && name != "br" {
        text.push('\n');
    }
}
