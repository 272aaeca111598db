use crate::css::{font_import_url, CompilePolicy, CssCompiler, CssText};
use crate::error::{Result, StyleError};
use crate::fields::{FieldName, FieldSet};
use crate::font_import::set_font_import;
use crate::last_input::LastInput;
use crate::patch::ActivePatch;
use crate::storage::KeyValueStore;
use crate::surface::TargetSurface;
use crate::theme::{ThemeStore, RESERVED_THEME_NAME};

/// A request from the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compile and apply these field values.
    Submit(FieldSet),
    /// A single form field changed.
    RememberInput { field: FieldName, value: String },
    /// Snapshot the live form as a new theme.
    CreateTheme(String),
    /// Put a theme into the form and apply it.
    LoadTheme(String),
    /// Replace a theme's fields with the live form.
    OverwriteTheme(String),
    RenameTheme { from: String, to: String },
    DeleteTheme(String),
    Export,
    Import(String),
    /// Change the dropdown selection; `None` or the placeholder clears it.
    Select(Option<String>),
}

/// What the panel needs back after a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(CssText),
    /// Theme names after a change to the theme list.
    Themes(Vec<String>),
    Exported(String),
    Done,
}

/// One customization session: the theme store, the applied patch and the live
/// form, loaded together from storage and driven by [`Command`]s.
pub struct Session<S> {
    store: S,
    compiler: CssCompiler,
    themes: ThemeStore,
    patch: ActivePatch,
    last_input: LastInput,
    selected: Option<String>,
}

impl<S: KeyValueStore> Session<S> {
    /// Loads everything from `store` in one read and seeds the default theme
    /// if there are none.
    pub async fn open(store: S, policy: CompilePolicy) -> Result<Self> {
        let entries = store.get_all().await?;
        let themes = ThemeStore::open_from(&entries, &store).await?;
        let patch = ActivePatch::from_entries(&entries);
        let last_input = LastInput::from_entries(&entries);

        tracing::debug!(
            themes = themes.len(),
            active_patch_len = patch.current().as_str().len(),
            "session opened"
        );
        Ok(Self {
            store,
            compiler: CssCompiler::new(policy),
            themes,
            patch,
            last_input,
            selected: None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn themes(&self) -> &ThemeStore {
        &self.themes
    }

    pub fn theme_names(&self) -> Vec<String> {
        self.themes.names().map(str::to_string).collect()
    }

    pub fn active_patch(&self) -> &CssText {
        self.patch.current()
    }

    /// The live form.
    pub fn form(&self) -> &FieldSet {
        self.last_input.form()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Applies `fields` to the surface: font import first, then the patch.
    pub async fn submit<T>(&mut self, surface: &mut T, fields: &FieldSet) -> Result<CssText>
    where
        T: TargetSurface + ?Sized,
    {
        set_font_import(surface, font_import_url(fields)).await?;
        let css = self.compiler.compile(fields);
        self.patch.replace(surface, &self.store, css.clone()).await?;
        Ok(css)
    }

    pub async fn remember_input(&mut self, field: FieldName, value: &str) -> Result<()> {
        self.last_input.remember(&self.store, field, value).await
    }

    /// Blanks every form field.
    pub async fn clear_form(&mut self) -> Result<()> {
        self.last_input.replace_form(&self.store, &FieldSet::new()).await
    }

    pub fn select(&mut self, name: Option<&str>) -> Result<()> {
        match name {
            None | Some(RESERVED_THEME_NAME) => self.selected = None,
            Some(name) => {
                if !self.themes.contains(name) {
                    return Err(StyleError::NotFound(name.to_string()));
                }
                self.selected = Some(name.to_string());
            }
        }
        Ok(())
    }

    /// Saves the non-blank form fields as theme `name` and selects it.
    pub async fn create_theme(&mut self, name: &str) -> Result<()> {
        let fields = self.last_input.form().clone();
        self.themes.create(&self.store, name, fields).await?;
        self.selected = Some(name.to_string());
        Ok(())
    }

    /// Replaces the whole form with theme `name`, selects it and applies it.
    pub async fn load_theme<T>(&mut self, surface: &mut T, name: &str) -> Result<CssText>
    where
        T: TargetSurface + ?Sized,
    {
        let fields = self.themes.load(name)?;
        self.last_input.replace_form(&self.store, &fields).await?;
        self.selected = Some(name.to_string());
        self.submit(surface, &fields).await
    }

    pub async fn overwrite_theme(&mut self, name: &str) -> Result<()> {
        let fields = self.last_input.form().clone();
        self.themes.overwrite(&self.store, name, fields).await
    }

    /// Renames a theme; a selection on it follows the new name.
    pub async fn rename_theme(&mut self, from: &str, to: &str) -> Result<()> {
        self.themes.rename(&self.store, from, to).await?;
        if self.selected.as_deref() == Some(from) {
            self.selected = Some(to.to_string());
        }
        Ok(())
    }

    /// Deletes a theme; a selection on it is dropped.
    pub async fn delete_theme(&mut self, name: &str) -> Result<()> {
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        self.themes.delete(&self.store, name).await
    }

    pub fn export_themes(&self) -> String {
        self.themes.export_all().to_json()
    }

    pub async fn import_themes(&mut self, text: &str) -> Result<()> {
        self.themes.import_all(&self.store, text).await?;
        if let Some(selected) = &self.selected {
            if !self.themes.contains(selected) {
                self.selected = None;
            }
        }
        Ok(())
    }

    pub async fn dispatch<T>(&mut self, surface: &mut T, command: Command) -> Result<Outcome>
    where
        T: TargetSurface + ?Sized,
    {
        tracing::debug!(?command, "dispatch");
        let outcome = match command {
            Command::Submit(fields) => Outcome::Applied(self.submit(surface, &fields).await?),
            Command::RememberInput { field, value } => {
                self.remember_input(field, &value).await?;
                Outcome::Done
            }
            Command::CreateTheme(name) => {
                self.create_theme(&name).await?;
                Outcome::Themes(self.theme_names())
            }
            Command::LoadTheme(name) => Outcome::Applied(self.load_theme(surface, &name).await?),
            Command::OverwriteTheme(name) => {
                self.overwrite_theme(&name).await?;
                Outcome::Done
            }
            Command::RenameTheme { from, to } => {
                self.rename_theme(&from, &to).await?;
                Outcome::Themes(self.theme_names())
            }
            Command::DeleteTheme(name) => {
                self.delete_theme(&name).await?;
                Outcome::Themes(self.theme_names())
            }
            Command::Export => Outcome::Exported(self.export_themes()),
            Command::Import(text) => {
                self.import_themes(&text).await?;
                Outcome::Themes(self.theme_names())
            }
            Command::Select(name) => {
                self.select(name.as_deref())?;
                Outcome::Done
            }
        };
        Ok(outcome)
    }
}
