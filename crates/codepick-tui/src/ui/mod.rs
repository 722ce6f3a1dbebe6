pub(crate) mod binary_choice;
pub(crate) mod loading;
pub(crate) mod modal;
pub(crate) mod search_modal;
pub(crate) mod selection_table;
pub(crate) mod text;
