//! Document XML générique navigable par chemin pointé
//!
//! Les réponses SOAP et les datagrammes WS-Discovery sont parsés en
//! [`XmlDocument`], interrogé avec des chemins comme
//! `"Envelope.Body.Fault.Reason.Text"`. Les préfixes de namespace sont ignorés :
//! chaque segment désigne le nom local d'un élément.
//!
//! Deux segments terminaux sont réservés :
//! - `-Nom` : l'attribut `Nom` de l'élément courant
//! - `#text` : le texte de l'élément courant (équivalent au segment précédent seul)

use std::io::BufReader;
use xmltree::{Element, XMLNode};

/// Préfixe désignant un attribut dans un chemin.
pub const ATTRIBUTE_PREFIX: char = '-';

/// Clé désignant le texte d'un élément dans un chemin.
pub const TEXT_KEY: &str = "#text";

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(#[from] xmltree::ParseError),

    #[error("Path {0} not found in document")]
    NotFound(String),
}

/// Arbre XML parsé, interrogeable par chemin.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Parse un document à partir de bytes XML
    pub fn parse(xml: &[u8]) -> Result<Self, XmlError> {
        let root = Element::parse(BufReader::new(xml))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Valeur unique au chemin donné (la première si plusieurs nœuds correspondent).
    pub fn value(&self, path: &str) -> Result<String, XmlError> {
        self.values(path)?
            .into_iter()
            .next()
            .ok_or_else(|| XmlError::NotFound(path.to_string()))
    }

    /// Toutes les valeurs au chemin donné, dans l'ordre du document.
    ///
    /// Les éléments frères de même nom sont tous collectés, à chaque niveau.
    pub fn values(&self, path: &str) -> Result<Vec<String>, XmlError> {
        let not_found = || XmlError::NotFound(path.to_string());
        let mut segments = path.split('.').filter(|s| !s.is_empty());

        let first = segments.next().ok_or_else(not_found)?;
        if self.root.name != first {
            return Err(not_found());
        }

        let mut current: Vec<&Element> = vec![&self.root];
        while let Some(segment) = segments.next() {
            let is_terminal = segment == TEXT_KEY || segment.starts_with(ATTRIBUTE_PREFIX);
            if is_terminal && segments.next().is_some() {
                return Err(not_found());
            }

            if segment == TEXT_KEY {
                return Ok(current.into_iter().map(element_text).collect());
            }

            if let Some(attribute) = segment.strip_prefix(ATTRIBUTE_PREFIX) {
                let found: Vec<String> = current
                    .into_iter()
                    .filter_map(|elem| elem.attributes.get(attribute).cloned())
                    .collect();
                if found.is_empty() {
                    return Err(not_found());
                }
                return Ok(found);
            }

            current = current
                .into_iter()
                .flat_map(|elem| child_elements(elem, segment))
                .collect();

            if current.is_empty() {
                return Err(not_found());
            }
        }

        Ok(current.into_iter().map(element_text).collect())
    }

    /// Indique si le chemin existe dans le document.
    pub fn contains(&self, path: &str) -> bool {
        self.values(path).is_ok()
    }
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent.children.iter().filter_map(move |node| match node {
        XMLNode::Element(elem) if elem.name == name => Some(elem),
        _ => None,
    })
}

fn element_text(elem: &Element) -> String {
    elem.get_text()
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}
