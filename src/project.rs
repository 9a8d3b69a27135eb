//! The project: the set of cases which can be combined.
use crate::case::{Case, CaseID};
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const PROJECT_FILE_NAME: &str = "project.toml";

/// A case as listed for selection, e.g. in a checklist
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableCaseEntry {
    /// The name of the case
    pub name: CaseID,
    /// The label shown to the user
    pub display_name: String,
    /// Whether the user has selected the case
    pub is_selected: bool,
}

/// Select or deselect the entry with the given display name
pub fn select(entries: &mut [SelectableCaseEntry], display_name: &str, selected: bool) -> Result<()> {
    let entry = entries
        .iter_mut()
        .find(|entry| entry.display_name == display_name)
        .with_context(|| format!("No case listed as {display_name}"))?;
    entry.is_selected = selected;

    Ok(())
}

/// The names of the selected entries, in list order
pub fn selected_names(entries: &[SelectableCaseEntry]) -> Vec<CaseID> {
    entries
        .iter()
        .filter(|entry| entry.is_selected)
        .map(|entry| entry.name.clone())
        .collect()
}

/// Contents of the project file
#[derive(Debug, Deserialize)]
struct ProjectFile {
    cases: Vec<Case>,
}

/// A collection of cases, in the order they were added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    cases: IndexMap<CaseID, Case>,
}

impl Project {
    /// Create an empty project
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a project from `project.toml` in the specified directory.
    ///
    /// The file holds a `[[cases]]` entry for each case, with its `name`, `technology`, `financing`
    /// and a table of `inputs`.
    pub fn from_path<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let file_path = project_dir.as_ref().join(PROJECT_FILE_NAME);
        let project_file: ProjectFile = read_toml(&file_path)?;

        let mut project = Self::new();
        for case in project_file.cases {
            project
                .add_case(case)
                .with_context(|| input_err_msg(&file_path))?;
        }

        Ok(project)
    }

    /// Add a case to the project. Case names must be unique.
    pub fn add_case(&mut self, case: Case) -> Result<()> {
        ensure!(
            !self.cases.contains_key(&case.name),
            "Duplicate case name: {}",
            case.name
        );
        self.cases.insert(case.name.clone(), case);

        Ok(())
    }

    /// Get a case by name
    pub fn get(&self, name: &str) -> Option<&Case> {
        self.cases.get(name)
    }

    /// Get a case by name, for modification
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Case> {
        self.cases.get_mut(name)
    }

    /// Iterate over the names of all cases
    pub fn case_names(&self) -> impl Iterator<Item = &CaseID> {
        self.cases.keys()
    }

    /// List the cases which could be combined into `target`, i.e. all cases except the target
    /// itself. None are selected initially.
    pub fn selectable_cases(&self, target: &str) -> Vec<SelectableCaseEntry> {
        self.case_names()
            .filter(|name| &*name.0 != target)
            .map(|name| SelectableCaseEntry {
                name: name.clone(),
                display_name: name.to_string(),
                is_selected: false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::FinancialModelKind;
    use crate::fixture::{assert_error, standard_case};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn project() -> Project {
        let mut project = Project::new();
        for name in ["Generic", "PV", "Wind"] {
            project.add_case(standard_case(name, 1.0)).unwrap();
        }
        project
    }

    #[test]
    fn test_add_duplicate_case() {
        let mut project = project();
        assert_error!(
            project.add_case(standard_case("PV", 2.0)),
            "Duplicate case name: PV"
        );
    }

    #[test]
    fn test_selectable_cases_exclude_target() {
        let project = project();
        let mut entries = project.selectable_cases("Generic");
        assert_eq!(
            entries
                .iter()
                .map(|entry| entry.display_name.as_str())
                .collect::<Vec<_>>(),
            ["PV", "Wind"]
        );
        assert!(selected_names(&entries).is_empty());

        select(&mut entries, "Wind", true).unwrap();
        select(&mut entries, "PV", true).unwrap();
        assert_eq!(
            selected_names(&entries),
            [CaseID::new("PV"), CaseID::new("Wind")]
        );

        select(&mut entries, "PV", false).unwrap();
        assert_eq!(selected_names(&entries), [CaseID::new("Wind")]);
        assert!(select(&mut entries, "Generic", true).is_err());
    }

    #[test]
    fn test_project_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PROJECT_FILE_NAME)).unwrap();
            writeln!(
                file,
                "[[cases]]\nname = \"PV\"\ntechnology = \"Photovoltaic\"\n\
                financing = \"Single Owner\"\n[cases.inputs]\nsystem_capacity = 100\n\
                degradation = [0.5]\n\n[[cases]]\nname = \"Wind\"\n\
                technology = \"Wind Power\"\nfinancing = \"None\""
            )
            .unwrap();
        }

        let project = Project::from_path(dir.path()).unwrap();
        let pv = project.get("PV").unwrap();
        assert_eq!(
            pv.financing,
            FinancialModelKind::Standard("Single Owner".into())
        );
        assert_eq!(pv.get_number("system_capacity").unwrap(), 100.0);
        let wind = project.get("Wind").unwrap();
        assert_eq!(wind.financing, FinancialModelKind::None);
        assert!(wind.inputs.is_empty());
    }

    #[test]
    fn test_project_from_path_duplicate_names() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PROJECT_FILE_NAME)).unwrap();
            writeln!(
                file,
                "[[cases]]\nname = \"PV\"\ntechnology = \"Photovoltaic\"\nfinancing = \"None\"\n\
                [[cases]]\nname = \"PV\"\ntechnology = \"Photovoltaic\"\nfinancing = \"None\""
            )
            .unwrap();
        }

        assert!(Project::from_path(dir.path()).is_err());
    }
}
