use chrono::NaiveDate;
use strum_macros::{AsRefStr, EnumString};

/// Interface languages the bot offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    Uz,
}

impl Lang {
    /// Unknown codes fall back to Russian.
    pub fn from_code(code: &str) -> Self {
        code.trim().to_lowercase().parse().unwrap_or_default()
    }
}

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

struct Phrases {
    new_task: &'static str,
    deadline: &'static str,
    read_more: &'static str,
}

fn phrases(lang: Lang) -> Phrases {
    match lang {
        Lang::Ru => Phrases {
            new_task: "Новая задача",
            deadline: "Дата сдачи",
            read_more: "Что бы прочитать полностью, перейдите в раздел задач с командой /tasks",
        },
        Lang::Uz => Phrases {
            new_task: "Yangi vazifa",
            deadline: "Topshirish sanasi",
            read_more: "To'liq o'qish uchun /tasks buyrug'i orqali vazifalar bo'limiga o'ting",
        },
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Telegram HTML message announcing a task assignment.
pub fn build_task_message(lang: Lang, title: &str, description: &str, deadline: NaiveDate) -> String {
    let p = phrases(lang);
    // cut before escaping so entities are never split
    let truncated = description.chars().count() > DESCRIPTION_PREVIEW_CHARS;
    let preview = if truncated {
        let head: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{}...", escape_html(&head))
    } else {
        escape_html(description)
    };
    let title = escape_html(title);

    let mut text = format!("<b><u>{}</u></b>\n\n", p.new_task);
    text.push_str(&format!("<b>{title}</b>\n"));
    text.push_str(&format!("<i>{preview}</i>\n\n"));
    text.push_str(&format!("{}: <b>{}</b>", p.deadline, deadline.format("%d-%m-%Y")));

    if truncated {
        text.push_str(&format!("\n\n<i>{}</i>", p.read_more));
    }
    text
}
