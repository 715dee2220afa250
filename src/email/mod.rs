mod queue;
mod sender;

pub use queue::{DeliveryError, EmailQueue};
pub use sender::{EmailSender, SendError, SmtpSender};

const WELCOME_HTML: &str = include_str!("templates/welcome.html");
const PASSWORD_RESET_HTML: &str = include_str!("templates/password_reset.html");

#[derive(Debug, Clone)]
pub enum EmailTemplate {
    Welcome { name: String },
    PasswordReset { name: String, reset_link: String },
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome { .. } => "Welcome to Crescendo",
            EmailTemplate::PasswordReset { .. } => "Reset your Crescendo password",
        }
    }

    pub fn render(&self) -> String {
        match self {
            EmailTemplate::Welcome { name } => {
                WELCOME_HTML.replace("{{name}}", &escape_html(name))
            }
            EmailTemplate::PasswordReset { name, reset_link } => PASSWORD_RESET_HTML
                .replace("{{name}}", &escape_html(name))
                .replace("{{reset_link}}", &escape_html(reset_link)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub template: EmailTemplate,
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_renders_name() {
        let body = EmailTemplate::Welcome {
            name: "John Doe".into(),
        }
        .render();
        assert!(body.contains("John Doe"));
        assert!(!body.contains("{{name}}"));
    }

    #[test]
    fn password_reset_renders_name_and_link() {
        let body = EmailTemplate::PasswordReset {
            name: "John Doe".into(),
            reset_link: "https://example.com/password/recovery?flow_id=abc:123".into(),
        }
        .render();
        assert!(body.contains("John Doe"));
        assert!(body.contains("flow_id=abc:123"));
        assert!(!body.contains("{{reset_link}}"));
    }

    #[test]
    fn template_values_are_escaped() {
        let body = EmailTemplate::Welcome {
            name: "<script>alert(1)</script>".into(),
        }
        .render();
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[test]
    fn subjects_are_fixed_per_template() {
        assert_eq!(
            EmailTemplate::Welcome { name: "x".into() }.subject(),
            "Welcome to Crescendo"
        );
        assert_eq!(
            EmailTemplate::PasswordReset {
                name: "x".into(),
                reset_link: "y".into()
            }
            .subject(),
            "Reset your Crescendo password"
        );
    }
}
