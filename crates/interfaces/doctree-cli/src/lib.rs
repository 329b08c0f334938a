pub mod commands;

use clap::ValueEnum;
use doctree_core::Category;

#[derive(ValueEnum, Clone, Debug, Copy)]
pub enum CliFileType {
    Any,
    Image,
    Audio,
    Video,
    Text,
    Application,
}

impl From<CliFileType> for Category {
    fn from(t: CliFileType) -> Self {
        match t {
            CliFileType::Any => Category::Any,
            CliFileType::Image => Category::Image,
            CliFileType::Audio => Category::Audio,
            CliFileType::Video => Category::Video,
            CliFileType::Text => Category::Text,
            CliFileType::Application => Category::Application,
        }
    }
}
