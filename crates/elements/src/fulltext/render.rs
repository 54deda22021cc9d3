use quick_xml::escape::escape;

use super::Categorizer;
use crate::consts::{FILE_ICON_PATH, LINE_BREAK, NOT_FOR_TEXT_END, NOT_FOR_TEXT_START};
use crate::labels::{Label, Labels};
use crate::models::{CategorizedLinks, ExternalLink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// CSS class of the links; none when empty.
    pub style: String,
    /// Markup placed between links.
    pub separator: String,
    pub show_icons: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { style: String::new(), separator: "; ".to_string(), show_icons: false }
    }
}

struct Anchors {
    class: String,
    icon: String,
}

impl Anchors {
    /// `text` is inserted as is.
    fn link(&self, url: &str, text: &str) -> String {
        format!(r#"<a{} href="{}">{}{text}</a>"#, self.class, escape(url), self.icon)
    }

    fn described(&self, links: &[ExternalLink], separator: &str) -> String {
        links
            .iter()
            .map(|link| self.link(&link.url, &escape(link.description.as_str())))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders categorized links as the HTML fragment shown on record pages.
///
/// Main files come first, one line per description with the files labelled
/// by format, followed by institutional and external links. The fragment is
/// wrapped in markers that keep it out of plain-text exports; nothing to
/// show renders as an empty string.
pub fn render(
    links: &CategorizedLinks,
    record_id: u64,
    categorizer: &Categorizer,
    options: &RenderOptions,
    labels: &dyn Labels,
) -> String {
    let site = categorizer.site_url();
    let class = match options.style.as_str() {
        "" => String::new(),
        style => format!(r#" class="{}""#, escape(style)),
    };
    let icon = match options.show_icons {
        true => format!(
            r#"<img style="border:none" src="{}" alt="{}"/>"#,
            escape(format!("{site}{FILE_ICON_PATH}")),
            escape(labels.text(Label::DownloadFulltext).as_ref()),
        ),
        false => String::new(),
    };
    let additional = match links.has_additional_files {
        true => format!(
            r#" <small>(<a{class} href="{}">{}</a>)</small>"#,
            escape(format!("{site}/record/{record_id}/files/")),
            escape(labels.text(Label::AdditionalFiles).as_ref()),
        ),
        false => String::new(),
    };
    let anchors = Anchors { class, icon };
    let mut out = String::new();

    // Names are repeated only when they change, and only if there are
    // several description groups to tell apart.
    let several = links.main.len() > 1;
    let mut last_name = "";
    for (description, group) in &links.main {
        let mut items = Vec::with_capacity(group.len());
        for link in group {
            let mut item = String::new();
            if several && link.base_name != last_name {
                item.push_str(&format!("<em>{}</em> - ", escape(link.base_name.as_str())));
            }
            last_name = link.base_name.as_str();
            item.push_str(&anchors.link(&link.url, &escape(link.format.to_uppercase())));
            items.push(item);
        }
        out.push_str(&format!("<strong>{}:</strong> ", escape(description.as_str())));
        out.push_str(&items.join(&options.separator));
        out.push_str(&additional);
        out.push_str(LINE_BREAK);
    }

    if let Some(institutional) = links.institutional.as_ref().filter(|links| !links.is_empty()) {
        let label = if institutional.len() == 1 { Label::SiteLink } else { Label::SiteLinks };
        let heading = labels.text(label).replace("{site}", &categorizer.institutional_rules().name);
        out.push_str(&format!("<strong>{}</strong>: ", escape(heading)));
        out.push_str(&anchors.described(institutional, &options.separator));
        out.push_str(LINE_BREAK);
    }

    if !links.external.is_empty() {
        let label = if links.external.len() == 1 { Label::ExternalLink } else { Label::ExternalLinks };
        out.push_str(&format!("<strong>{}</strong>: ", escape(capitalize(&labels.text(label)))));
        out.push_str(&anchors.described(&links.external, &options.separator));
        out.push_str(LINE_BREAK);
    }

    if let Some(stripped) = out.strip_suffix(LINE_BREAK) {
        out.truncate(stripped.len());
    }
    match out.is_empty() {
        true => out,
        false => format!("{NOT_FOR_TEXT_START}{out}{NOT_FOR_TEXT_END}"),
    }
}
