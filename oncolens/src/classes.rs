//! The 16-class multi-cancer taxonomy
//!
//! Class order is fixed and matches the alphabetically sorted directory
//! names of the training dataset. Index positions are baked into trained
//! model checkpoints, so this list must never be reordered.

/// Total number of classes
pub const NUM_CLASSES: usize = 16;

/// Class names, format: "organ_finding"
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "brain_glioma",
    "brain_menin",
    "brain_tumor",
    "breast_benign",
    "breast_malignant",
    "cervix_dyk",
    "cervix_koc",
    "cervix_mep",
    "cervix_pab",
    "colon_aca",
    "colon_bnt",
    "kidney_normal",
    "kidney_tumor",
    "lung_aca",
    "lung_bnt",
    "lung_scc",
];

/// Human-readable descriptions, indexed in lockstep with [`CLASS_NAMES`]
pub const CLASS_DESCRIPTIONS: [&str; NUM_CLASSES] = [
    "Tumor from supportive glial cells in the brain; can be benign or malignant. (brain_glioma)",
    "Meningioma, a usually benign tumor of the protective membranes around the brain. (brain_menin)",
    "General brain tumor, abnormal cell growth in brain tissue. (brain_tumor)",
    "Non-cancerous breast tumor that does not invade surrounding tissue. (breast_benign)",
    "Cancerous breast tumor that can invade nearby tissue and spread. (breast_malignant)",
    "Precancerous abnormal cervical cells (dyskaryosis) with potential to progress. (cervix_dyk)",
    "Keratinizing cervical squamous cell carcinoma, an invasive type of cervical cancer. (cervix_koc)",
    "Benign transformation of cervical epithelial cells (metaplasia). (cervix_mep)",
    "Cervical papilloma, a usually benign wart-like growth. (cervix_pab)",
    "Malignant colon adenocarcinoma, cancer from gland cells. (colon_aca)",
    "Benign colon tumor, a non-cancerous growth in colon tissue. (colon_bnt)",
    "Healthy kidney tissue with no abnormal growth. (kidney_normal)",
    "Tumor in the kidney; may be benign or malignant. (kidney_tumor)",
    "Lung adenocarcinoma, cancer arising from mucus-producing cells. (lung_aca)",
    "Non-cancerous lung tumor. (lung_bnt)",
    "Lung squamous cell carcinoma, lung cancer from squamous cells. (lung_scc)",
];

/// Get the class name for a given label index
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Get the label index for a given class name
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|&n| n == name)
}

/// Get the description for a given label index
pub fn class_description(label: usize) -> Option<&'static str> {
    CLASS_DESCRIPTIONS.get(label).copied()
}

/// Get the organ name from a class (e.g. "brain" from "brain_glioma")
pub fn organ_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).and_then(|name| name.split('_').next())
}
