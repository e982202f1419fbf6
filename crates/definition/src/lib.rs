//! Report Definition Tree
//!
//! This crate defines the in-memory representation of a report as the
//! traversal engine sees it: a report header and footer, a flat list of nested
//! groups (outermost first), an item band, an optional no-data band, and
//! sub-reports hosted by any band.

use quire_types::InstanceId;
use quire_types::geometry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("Group '{0}' is a crosstab axis and cannot be the outermost group")]
    AxisAsRootGroup(String),
    #[error("Crosstab row axis '{0}' has no column axis nested inside it")]
    UnpairedRowAxis(String),
    #[error("Crosstab column axis '{0}' is not nested inside a row or column axis")]
    ColumnAxisOutsideRowAxis(String),
    #[error("Relational group '{0}' cannot be nested inside a crosstab axis")]
    RelationalInsideCrosstab(String),
    #[error("Crosstab axis '{0}' declares no field")]
    EmptyAxisFields(String),
    #[error("Sub-report '{report}': {source}")]
    SubReport {
        report: String,
        #[source]
        source: Box<DefinitionError>,
    },
    #[error("Invalid report definition JSON: {0}")]
    Json(String),
}

/// The semantics of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    /// Breaks whenever one of its fields changes value.
    #[default]
    Relational,
    /// A row dimension of a crosstab section.
    CrosstabRow,
    /// A column dimension of a crosstab section.
    CrosstabColumn,
}

impl GroupKind {
    pub fn is_crosstab(self) -> bool {
        !matches!(self, GroupKind::Relational)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Relational => "relational",
            GroupKind::CrosstabRow => "crosstab-row",
            GroupKind::CrosstabColumn => "crosstab-column",
        }
    }
}

/// Identifies one band of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandAddress {
    ReportHeader,
    GroupHeader(usize),
    ItemBand,
    NoDataBand,
    GroupFooter(usize),
    ReportFooter,
}

/// Binds a value of the parent's data row to a parameter name in a sub-report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Field name in the parent's data row.
    pub outer: String,
    /// Name under which the value is visible inside the sub-report.
    pub inner: String,
}

impl ParameterMapping {
    pub fn new(outer: impl Into<String>, inner: impl Into<String>) -> Self {
        Self {
            outer: outer.into(),
            inner: inner.into(),
        }
    }
}

/// A nested report processed after the band that hosts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubReport {
    pub report: Arc<ReportDefinition>,
    #[serde(default)]
    pub parameters: Vec<ParameterMapping>,
}

impl SubReport {
    pub fn new(report: ReportDefinition) -> Self {
        Self {
            report: Arc::new(report),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.parameters.push(ParameterMapping::new(outer, inner));
        self
    }
}

/// A horizontal section of output. Only its height (in points) and hosted
/// sub-reports matter to traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub subreports: Vec<SubReport>,
}

impl Band {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_subreport(mut self, subreport: SubReport) -> Self {
        self.subreports.push(subreport);
        self
    }

    /// Height in micro-points.
    pub fn height_internal(&self) -> i64 {
        geometry::to_internal(self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub kind: GroupKind,
    /// Break fields. An empty list never breaks.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub header: Band,
    #[serde(default)]
    pub footer: Band,
}

impl Group {
    fn with_kind(name: impl Into<String>, kind: GroupKind, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            fields,
            header: Band::default(),
            footer: Band::default(),
        }
    }

    pub fn relational<S: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        let fields = fields.into_iter().map(Into::into).collect();
        Self::with_kind(name, GroupKind::Relational, fields)
    }

    pub fn crosstab_rows(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_kind(name, GroupKind::CrosstabRow, vec![field.into()])
    }

    pub fn crosstab_columns(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_kind(name, GroupKind::CrosstabColumn, vec![field.into()])
    }

    pub fn with_header(mut self, header: Band) -> Self {
        self.header = header;
        self
    }

    pub fn with_footer(mut self, footer: Band) -> Self {
        self.footer = footer;
        self
    }
}

/// A report or sub-report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    #[serde(skip, default = "InstanceId::generate")]
    id: InstanceId,
    pub name: String,
    /// Name of the query resolved through the data factory.
    pub query: String,
    #[serde(default)]
    pub report_header: Band,
    #[serde(default)]
    pub report_footer: Band,
    /// Outermost first.
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub item_band: Band,
    #[serde(default)]
    pub no_data_band: Option<Band>,
}

impl ReportDefinition {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: InstanceId::generate(),
            name: name.into(),
            query: query.into(),
            report_header: Band::default(),
            report_footer: Band::default(),
            groups: Vec::new(),
            item_band: Band::default(),
            no_data_band: None,
        }
    }

    /// Parses a definition from JSON.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::Json` for malformed input. Structure is not
    /// validated here; see [`ReportDefinition::validate`].
    pub fn from_json(source: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(source).map_err(|e| DefinitionError::Json(e.to_string()))
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_report_header(mut self, band: Band) -> Self {
        self.report_header = band;
        self
    }

    pub fn with_report_footer(mut self, band: Band) -> Self {
        self.report_footer = band;
        self
    }

    pub fn with_item_band(mut self, band: Band) -> Self {
        self.item_band = band;
        self
    }

    pub fn with_no_data_band(mut self, band: Band) -> Self {
        self.no_data_band = Some(band);
        self
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn band(&self, address: BandAddress) -> Option<&Band> {
        match address {
            BandAddress::ReportHeader => Some(&self.report_header),
            BandAddress::GroupHeader(i) => self.groups.get(i).map(|g| &g.header),
            BandAddress::ItemBand => Some(&self.item_band),
            BandAddress::NoDataBand => self.no_data_band.as_ref(),
            BandAddress::GroupFooter(i) => self.groups.get(i).map(|g| &g.footer),
            BandAddress::ReportFooter => Some(&self.report_footer),
        }
    }

    /// Checks the group nesting rules of this report and every sub-report.
    ///
    /// The traversal engine enforces the same rules when it reaches an offending
    /// group; this check lets callers reject a definition before any pass runs.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, outermost group first.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut previous: Option<GroupKind> = None;
        for group in &self.groups {
            match (previous, group.kind) {
                (None, GroupKind::CrosstabRow | GroupKind::CrosstabColumn) => {
                    return Err(DefinitionError::AxisAsRootGroup(group.name.clone()));
                }
                (Some(GroupKind::Relational), GroupKind::CrosstabColumn) => {
                    return Err(DefinitionError::ColumnAxisOutsideRowAxis(group.name.clone()));
                }
                (Some(GroupKind::CrosstabColumn), GroupKind::CrosstabRow) => {
                    return Err(DefinitionError::ColumnAxisOutsideRowAxis(group.name.clone()));
                }
                (Some(GroupKind::CrosstabRow | GroupKind::CrosstabColumn), GroupKind::Relational) => {
                    return Err(DefinitionError::RelationalInsideCrosstab(group.name.clone()));
                }
                _ => {}
            }
            if group.kind.is_crosstab() && group.fields.is_empty() {
                return Err(DefinitionError::EmptyAxisFields(group.name.clone()));
            }
            previous = Some(group.kind);
        }
        if let Some(last) = self.groups.last()
            && last.kind == GroupKind::CrosstabRow
        {
            return Err(DefinitionError::UnpairedRowAxis(last.name.clone()));
        }

        for band in self.bands() {
            for subreport in &band.subreports {
                subreport
                    .report
                    .validate()
                    .map_err(|e| DefinitionError::SubReport {
                        report: subreport.report.name.clone(),
                        source: Box::new(e),
                    })?;
            }
        }
        Ok(())
    }

    fn bands(&self) -> impl Iterator<Item = &Band> {
        std::iter::once(&self.report_header)
            .chain(self.groups.iter().map(|g| &g.header))
            .chain(std::iter::once(&self.item_band))
            .chain(self.no_data_band.iter())
            .chain(self.groups.iter().map(|g| &g.footer))
            .chain(std::iter::once(&self.report_footer))
    }
}
