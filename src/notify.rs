//! Transient status messages shown after submit and export.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(title: &str, description: &str) -> Self {
        Self { title: title.into(), description: description.into(), severity: Severity::Success }
    }

    pub fn failure(title: &str, description: &str) -> Self {
        Self { title: title.into(), description: description.into(), severity: Severity::Failure }
    }

    pub fn quote_saved(updated: bool) -> Self {
        let description = if updated {
            "Orçamento atualizado com sucesso!"
        } else {
            "Orçamento foi salvo com sucesso!"
        };
        Self::success("Orçamento Salvo", description)
    }

    pub fn save_failed() -> Self {
        Self::failure("Erro", "Falha ao salvar orçamento. Tente novamente.")
    }

    pub fn pdf_generated() -> Self {
        Self::success("PDF Gerado", "O PDF foi gerado com sucesso!")
    }

    pub fn export_failed() -> Self {
        Self::failure("Erro", "Houve um erro ao gerar o PDF. Tente novamente.")
    }
}

pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Prints to the terminal; failures go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.severity {
            Severity::Success => {
                println!("✅ {}: {}", notification.title, notification.description)
            }
            Severity::Failure => {
                eprintln!("❌ {}: {}", notification.title, notification.description)
            }
        }
    }
}

/// Keeps every notification; handy when driving a session without a terminal.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub received: Vec<Notification>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: Notification) {
        self.received.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_message_depends_on_edit() {
        assert_eq!(Notification::quote_saved(false).description, "Orçamento foi salvo com sucesso!");
        assert_eq!(Notification::quote_saved(true).description, "Orçamento atualizado com sucesso!");
    }

    #[test]
    fn failures_use_distinct_severity() {
        assert_eq!(Notification::save_failed().severity, Severity::Failure);
        assert_eq!(Notification::export_failed().severity, Severity::Failure);
        assert_eq!(Notification::pdf_generated().severity, Severity::Success);
    }
}
