//! Static field-mapping, alias and marker tables.
//!
//! Each platform gets three immutable tables, built once at first use:
//!
//! - a **field map** from universal parameter names to the platform's
//!   field names (a pure key-renaming projection),
//! - a **tool alias map** resolving cross-platform synonyms (Omie calls
//!   cost centres "departamentos", Nibo calls them "centros de custo"),
//! - a **marker list** pairing the top-level keys that identify a list
//!   response with the entity-type tag for the uniform envelope.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::adapter::Platform;

static OMIE_FIELDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("page", "pagina"),
        ("limit", "registros_por_pagina"),
        ("start_date", "data_inicio"),
        ("end_date", "data_fim"),
        ("name", "razao_social"),
        ("document", "cnpj_cpf"),
        ("entity_id", "codigo_cliente"),
        ("supplier_id", "codigo_fornecedor"),
        ("document_number", "numero_documento"),
        ("due_date", "data_vencimento"),
        ("amount", "valor_documento"),
        ("category", "codigo_categoria"),
    ])
});

static NIBO_FIELDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("page", "pagina"),
        ("limit", "registros_por_pagina"),
        ("start_date", "data_inicio"),
        ("end_date", "data_fim"),
        ("entity_id", "id"),
        ("category", "category_id"),
    ])
});

static OMIE_TOOL_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    // Omie speaks departamentos; the universal cost-centre name is an alias.
    HashMap::from([("consultar_centros_custo", "consultar_departamentos")])
});

static NIBO_TOOL_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    // Nibo speaks centros de custo; the departmental name is an alias.
    HashMap::from([("consultar_departamentos", "consultar_centros_custo")])
});

/// Top-level response keys that identify a list payload, with the
/// entity-type tag each one implies.
const OMIE_MARKERS: &[(&str, &str)] = &[
    ("clientes_cadastro", "cliente"),
    ("fornecedores_cadastro", "fornecedor"),
    ("categorias", "categoria"),
    ("departamentos", "departamento"),
];

const NIBO_MARKERS: &[(&str, &str)] = &[
    ("clientes", "cliente"),
    ("fornecedores", "fornecedor"),
    ("categorias", "categoria"),
    ("centros_custo", "centro_custo"),
    ("socios", "socio"),
];

/// The universal→platform field table for a platform.
pub(crate) fn field_map(platform: Platform) -> &'static HashMap<&'static str, &'static str> {
    match platform {
        Platform::Omie => &OMIE_FIELDS,
        Platform::Nibo => &NIBO_FIELDS,
    }
}

/// The tool-name alias table for a platform.
pub(crate) fn tool_aliases(platform: Platform) -> &'static HashMap<&'static str, &'static str> {
    match platform {
        Platform::Omie => &OMIE_TOOL_ALIASES,
        Platform::Nibo => &NIBO_TOOL_ALIASES,
    }
}

/// The list-marker table for a platform.
pub(crate) const fn list_markers(platform: Platform) -> &'static [(&'static str, &'static str)] {
    match platform {
        Platform::Omie => OMIE_MARKERS,
        Platform::Nibo => NIBO_MARKERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omie_maps_pagination_fields() {
        let fields = field_map(Platform::Omie);
        assert_eq!(fields.get("page"), Some(&"pagina"));
        assert_eq!(fields.get("limit"), Some(&"registros_por_pagina"));
    }

    #[test]
    fn nibo_keeps_native_english_names_out_of_the_table() {
        // Nibo already uses `name`/`document`, so the table must not touch them.
        let fields = field_map(Platform::Nibo);
        assert!(!fields.contains_key("name"));
        assert!(!fields.contains_key("document"));
    }

    #[test]
    fn cost_centre_aliases_are_inverse_across_platforms() {
        assert_eq!(
            tool_aliases(Platform::Omie).get("consultar_centros_custo"),
            Some(&"consultar_departamentos")
        );
        assert_eq!(
            tool_aliases(Platform::Nibo).get("consultar_departamentos"),
            Some(&"consultar_centros_custo")
        );
    }

    #[test]
    fn marker_tables_tag_entity_types() {
        let omie = list_markers(Platform::Omie);
        assert!(omie.contains(&("clientes_cadastro", "cliente")));

        let nibo = list_markers(Platform::Nibo);
        assert!(nibo.contains(&("socios", "socio")));
    }
}
