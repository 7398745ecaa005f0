mod settings;

pub use settings::{
    Command, Config, NotificationSettings, ProbeSettings, Settings, TargetSettings,
};
