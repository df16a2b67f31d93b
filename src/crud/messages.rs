//! User-facing texts. Articles and endings follow the resource's grammatical gender.

use crate::config::{CrudConfig, Gender};

pub const CREATED: &str = "Elemento creado exitosamente";

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower(cfg: &CrudConfig) -> String {
    cfg.display_name.to_lowercase()
}

pub fn create_title(cfg: &CrudConfig) -> String {
    format!("Crear {}", cfg.display_name)
}

pub fn create_description(cfg: &CrudConfig) -> String {
    let (un, nuevo) = match cfg.gender {
        Gender::Masculine => ("un", "nuevo"),
        Gender::Feminine => ("una", "nueva"),
    };
    format!("Completá los campos para crear {} {} {}.", un, nuevo, lower(cfg))
}

pub fn update_title(cfg: &CrudConfig) -> String {
    format!("Editar {}", cfg.display_name)
}

pub fn update_description(cfg: &CrudConfig) -> String {
    let de = match cfg.gender {
        Gender::Masculine => "del",
        Gender::Feminine => "de la",
    };
    format!("Modificá los campos que quieras editar {} {}.", de, lower(cfg))
}

/// Deletion is a deactivation, and the default wording says so.
pub fn delete_confirmation(cfg: &CrudConfig) -> String {
    if let Some(custom) = &cfg.delete_message {
        return custom.clone();
    }
    format!(
        "¿Está seguro que desea eliminar {} {}? Esta acción no {} eliminará, solo dejará de estar disponible para futuros movimientos.",
        cfg.gender.article(),
        lower(cfg),
        cfg.gender.object_pronoun()
    )
}

pub fn create_failed(message: &str) -> String {
    format!("Error al crear el elemento: {}", message)
}

/// Update texts are fixed masculine; delete texts follow the gender.
pub fn updated(cfg: &CrudConfig) -> String {
    format!("{} actualizado exitosamente", capitalize(&cfg.model))
}

pub fn update_failed(cfg: &CrudConfig, message: &str) -> String {
    format!("Error al actualizar el {}: {}", cfg.model, message)
}

pub fn deleted(cfg: &CrudConfig) -> String {
    format!(
        "{} eliminad{} correctamente",
        capitalize(&cfg.model),
        cfg.gender.ending()
    )
}

pub fn delete_failed(cfg: &CrudConfig, message: &str) -> String {
    format!(
        "Error al eliminar {} {}: {}",
        cfg.gender.article(),
        cfg.model,
        message
    )
}
