pub(crate) mod groups;
