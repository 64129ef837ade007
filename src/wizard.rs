//! Terminal prompts driving a [`Session`], plus the settings and company wizards.

use std::fmt;

use comfy_table::{Cell, CellAlignment, Color, Table};
use inquire::{Confirm, InquireError, Select, Text};

use crate::config::{self, AppSettings, StoreSettings, DEFAULT_DATA_ROOT};
use crate::editor::{ClientField, CompanyField, ItemField, QuoteEditor};
use crate::error::SessionError;
use crate::export::Exporter;
use crate::model::{format_money, CompanyProfile, DocumentKind};
use crate::notify::Notifier;
use crate::session::{Session, SessionState};
use crate::store::QuoteStore;

type PromptResult<T> = Result<T, InquireError>;

// Esc backs out of a single prompt; Ctrl-C still ends the program
fn optional<T>(result: PromptResult<T>) -> PromptResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e),
    }
}

// ==========================================
// Menus
// ==========================================

#[derive(Clone, Copy)]
enum EditAction {
    Client,
    Company,
    AddItem,
    EditItem,
    RemoveItem,
    Notes,
    Submit,
    Quit,
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EditAction::Client => "👤 Dados do Cliente",
            EditAction::Company => "🏢 Dados da Empresa",
            EditAction::AddItem => "➕ Adicionar Item",
            EditAction::EditItem => "✏️  Editar Item",
            EditAction::RemoveItem => "🗑️  Remover Item",
            EditAction::Notes => "📝 Observações",
            EditAction::Submit => "✅ Gerar Orçamento",
            EditAction::Quit => "🚪 Sair",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy)]
enum ReviewAction {
    SwitchKind(DocumentKind),
    Edit,
    New,
    Export,
    Quit,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::SwitchKind(kind) => write!(f, "🔁 Mudar para {}", kind.label()),
            ReviewAction::Edit => f.write_str("✏️  Editar Orçamento"),
            ReviewAction::New => f.write_str("🆕 Criar Novo Orçamento"),
            ReviewAction::Export => f.write_str("📄 Baixar PDF"),
            ReviewAction::Quit => f.write_str("🚪 Sair"),
        }
    }
}

/// Runs the create → edit → review loop until the operator quits.
pub fn run_session<S, E, N>(session: &mut Session<S, E, N>) -> PromptResult<()>
where
    S: QuoteStore,
    E: Exporter,
    N: Notifier,
{
    loop {
        let keep_going = match session.state() {
            SessionState::Creating | SessionState::Editing => editing_step(session)?,
            SessionState::Reviewing => reviewing_step(session)?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

fn editing_step<S, E, N>(session: &mut Session<S, E, N>) -> PromptResult<bool>
where
    S: QuoteStore,
    E: Exporter,
    N: Notifier,
{
    let heading = match session.state() {
        SessionState::Editing => "Editar Orçamento",
        _ => "Criar Novo Orçamento",
    };
    let Some(editor) = session.editor_mut() else {
        return Ok(true);
    };

    println!("\n--- {} ---", heading);
    println!("{}", items_table(editor));

    let mut actions = vec![
        EditAction::Client,
        EditAction::Company,
        EditAction::AddItem,
        EditAction::EditItem,
    ];
    // the last item is not removable, so the action is not offered
    if editor.can_remove_item() {
        actions.push(EditAction::RemoveItem);
    }
    actions.extend([EditAction::Notes, EditAction::Submit, EditAction::Quit]);

    let Some(action) = optional(Select::new("O que deseja fazer?", actions).prompt())? else {
        return Ok(true);
    };

    match action {
        EditAction::Client => edit_client(editor)?,
        EditAction::Company => edit_company(editor)?,
        EditAction::AddItem => {
            editor.add_item();
            let index = editor.items().len() - 1;
            edit_item(editor, index)?;
        }
        EditAction::EditItem => {
            if let Some(index) = pick_item(editor, "Qual item?")? {
                edit_item(editor, index)?;
            }
        }
        EditAction::RemoveItem => {
            if let Some(index) = pick_item(editor, "Remover qual item?")? {
                editor.remove_item(index);
            }
        }
        EditAction::Notes => edit_notes(editor)?,
        EditAction::Submit => match session.submit() {
            Ok(_) => {}
            Err(SessionError::Invalid(errors)) => {
                println!("⚠️  Preencha os campos obrigatórios:");
                for error in errors {
                    println!("   - {}", error);
                }
            }
            // already announced by the notifier; the editor is untouched for a retry
            Err(_) => {}
        },
        EditAction::Quit => {
            let quit = Confirm::new("Sair e descartar o orçamento atual?")
                .with_default(false)
                .prompt()?;
            return Ok(!quit);
        }
    }
    Ok(true)
}

fn reviewing_step<S, E, N>(session: &mut Session<S, E, N>) -> PromptResult<bool>
where
    S: QuoteStore,
    E: Exporter,
    N: Notifier,
{
    if let Some(preview) = session.preview() {
        println!("\n{}", preview);
    }

    let actions = vec![
        ReviewAction::SwitchKind(session.document_kind().toggled()),
        ReviewAction::Edit,
        ReviewAction::New,
        ReviewAction::Export,
        ReviewAction::Quit,
    ];
    let Some(action) = optional(Select::new("Tipo de Documento e ações:", actions).prompt())? else {
        return Ok(true);
    };

    match action {
        ReviewAction::SwitchKind(kind) => session.set_document_kind(kind),
        ReviewAction::Edit => {
            session.edit().ok();
        }
        ReviewAction::New => {
            session.new_quote().ok();
        }
        ReviewAction::Export => {
            if let Ok(path) = session.export() {
                println!("📄 {}", path.display());
            }
        }
        ReviewAction::Quit => return Ok(false),
    }
    Ok(true)
}

// ==========================================
// Editor prompts
// ==========================================

fn items_table(editor: &QuoteEditor) -> String {
    let mut table = Table::new();
    table.set_header(vec!["#", "Descrição", "Quantidade", "Preço", "Total"]);

    for (index, item) in editor.items().iter().enumerate() {
        let quantity = match item.quantity() {
            Some(q) => Cell::new(q),
            None => Cell::new(format!("{} ⚠️", item.quantity_input())).fg(Color::Red),
        };
        let price = match item.unit_price() {
            Some(p) => Cell::new(format_money(p)),
            None => Cell::new(format!("{} ⚠️", item.unit_price_input())).fg(Color::Red),
        };
        let line_total = item
            .to_line_item()
            .and_then(|line| line.line_total())
            .map_or_else(|| "-".to_string(), format_money);
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&item.description),
            quantity.set_alignment(CellAlignment::Right),
            price.set_alignment(CellAlignment::Right),
            Cell::new(line_total).set_alignment(CellAlignment::Right),
        ]);
    }

    let total = editor
        .running_total()
        .map(format_money)
        .unwrap_or_else(|| "-".to_string());
    format!("{table}\nTotal: {total}")
}

fn pick_item(editor: &QuoteEditor, message: &str) -> PromptResult<Option<usize>> {
    if editor.items().len() == 1 {
        return Ok(Some(0));
    }
    let options: Vec<String> = editor
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.description))
        .collect();
    let choice = optional(Select::new(message, options).raw_prompt())?;
    Ok(choice.map(|c| c.index))
}

fn edit_item(editor: &mut QuoteEditor, index: usize) -> PromptResult<()> {
    let Some(item) = editor.items().get(index).cloned() else {
        return Ok(());
    };

    let fields = [
        (ItemField::Description, "Descrição:", item.description.clone()),
        (ItemField::Quantity, "Quantidade:", item.quantity_input().to_string()),
        (ItemField::UnitPrice, "Preço (R$):", item.unit_price_input().to_string()),
    ];
    for (field, label, current) in fields {
        let Some(value) = optional(Text::new(label).with_initial_value(&current).prompt())? else {
            return Ok(());
        };
        if !editor.update_item(index, field, &value) {
            println!("⚠️  Valor inválido para '{}'; corrija antes de gerar o orçamento.", label.trim_end_matches(':'));
        }
    }
    Ok(())
}

fn edit_client(editor: &mut QuoteEditor) -> PromptResult<()> {
    let name = Text::new("Nome do Cliente:")
        .with_initial_value(editor.client_name())
        .prompt();
    if let Some(name) = optional(name)? {
        editor.update_client_field(ClientField::Name, &name);
    }

    let phone = Text::new("Celular:")
        .with_initial_value(editor.client_phone())
        .with_placeholder("(00) 00000-0000")
        .prompt();
    if let Some(phone) = optional(phone)? {
        editor.update_client_field(ClientField::Phone, &phone);
    }
    Ok(())
}

fn company_prompt(field: CompanyField) -> (&'static str, Option<&'static str>) {
    match field {
        CompanyField::Name => ("Nome da Empresa:", None),
        CompanyField::Phone => ("Telefone:", Some("(00) 0000-0000")),
        CompanyField::Address => ("Endereço:", None),
        CompanyField::TaxId => ("CNPJ:", Some("00.000.000/0000-00")),
    }
}

fn prompt_company(current: &CompanyProfile) -> PromptResult<Vec<(CompanyField, String)>> {
    let mut answers = Vec::new();
    for field in CompanyField::ALL {
        let (label, placeholder) = company_prompt(field);
        let mut prompt = Text::new(label).with_initial_value(field.get(current));
        if let Some(placeholder) = placeholder {
            prompt = prompt.with_placeholder(placeholder);
        }
        if let Some(value) = optional(prompt.prompt())? {
            answers.push((field, value));
        }
    }
    Ok(answers)
}

fn edit_company(editor: &mut QuoteEditor) -> PromptResult<()> {
    for (field, value) in prompt_company(editor.company())? {
        editor.update_company_field(field, &value);
    }
    Ok(())
}

fn edit_notes(editor: &mut QuoteEditor) -> PromptResult<()> {
    println!("💡 Tip: Use '\\n' for new lines.");
    let current = editor.notes().replace('\n', "\\n");
    if let Some(notes) = optional(Text::new("Observações:").with_initial_value(&current).prompt())? {
        editor.set_notes(&notes.replace("\\n", "\n"));
    }
    Ok(())
}

// ==========================================
// Settings & company wizards
// ==========================================

pub fn setup_config_wizard() -> anyhow::Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let path = config::config_path();
    let current = config::load_settings_from(&path).ok().flatten();
    let default_root = current
        .as_ref()
        .map(|s| s.data_root.clone())
        .unwrap_or_else(|| DEFAULT_DATA_ROOT.to_string());

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let data_root = match picked_path {
        Some(path) => path.to_string_lossy().to_string(),
        None => {
            println!("❌ No folder selected. Falling back to manual input.");
            Text::new("Enter Root Data Directory:")
                .with_default(&default_root)
                .prompt()?
        }
    };

    let backends = vec!["Local", "Firebase"];
    let store = match Select::new("Where should quotes be saved?", backends).prompt()? {
        "Firebase" => {
            let existing_url = match current.as_ref().map(|s| &s.store) {
                Some(StoreSettings::Firebase { database_url }) => database_url.clone(),
                _ => String::new(),
            };
            let database_url = Text::new("Firebase Realtime Database URL:")
                .with_initial_value(&existing_url)
                .with_placeholder("https://<project>-default-rtdb.firebaseio.com")
                .prompt()?;
            StoreSettings::Firebase { database_url }
        }
        _ => StoreSettings::Local,
    };

    let mut settings = current.unwrap_or_else(|| AppSettings::new(DEFAULT_DATA_ROOT));
    settings.data_root = data_root;
    settings.store = store;

    config::save_settings_to(&path, &settings)?;
    println!("✅ Settings saved to {}", path.display());
    Ok(settings)
}

/// Edits the company block that pre-fills every new quote.
pub fn company_wizard(settings: &AppSettings) -> anyhow::Result<CompanyProfile> {
    println!("\n--- Dados da Empresa ---");
    let path = settings.company_path();
    let mut company = config::load_company_profile(&path)?.unwrap_or_default();

    let mut editor = QuoteEditor::with_company(company.clone());
    for (field, value) in prompt_company(&company)? {
        editor.update_company_field(field, &value);
    }
    company = editor.company().clone();

    let missing: Vec<String> = CompanyField::ALL
        .iter()
        .filter(|f| f.get(&company).trim().is_empty())
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        println!("⚠️  Still empty: {} (quotes will ask for them)", missing.join(", "));
    }

    config::save_company_profile(&path, &company)?;
    println!("✅ Company profile saved to {}", path.display());
    Ok(company)
}
