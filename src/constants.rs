pub const DEFAULT_CATEGORIES: [DefaultCategory; 6] = [
    DefaultCategory {
        id: "meta",
        label: "Integração Meta",
        icon: "◈",
    },
    DefaultCategory {
        id: "sustentacao",
        label: "Sustentação",
        icon: "⚙",
    },
    DefaultCategory {
        id: "gestao",
        label: "Sistema de Gestão V2",
        icon: "◧",
    },
    DefaultCategory {
        id: "listbuilding",
        label: "Listbuilding",
        icon: "◫",
    },
    DefaultCategory {
        id: "onboarding",
        label: "Max Onboarding",
        icon: "◰",
    },
    DefaultCategory {
        id: "outros",
        label: "Outros",
        icon: "◇",
    },
];

pub const DEFAULT_ICON: &str = "◆";

pub const QUICK_TASKS: &[QuickTaskPreset] = &[
    QuickTaskPreset {
        category_id: "meta",
        texts: &["Monitoramento e sustentação de templates e números Meta"],
    },
    QuickTaskPreset {
        category_id: "sustentacao",
        texts: &[
            "Acompanhei o canal de alertas e o banco do Airflow, garantindo a execução das rotinas e tratando as falhas identificadas ao longo do dia",
        ],
    },
];

pub const STORAGE_KEYS: StorageKeys = StorageKeys {
    daily: "checkin-data",
    weekly: "checkin-weekly",
    categories: "checkin-categories",
    history: "checkin-history",
    mode: "checkin-mode",
    collapsed: "checkin-collapsed",
    clear_armed: "checkin-clear-armed",
};

pub const LIMITS: Limits = Limits {
    history_entries: 30,
    clear_confirm_seconds: 3,
    recent_entries: 7,
};

pub const EXPORT_FORMAT: ExportGlyphs = ExportGlyphs {
    category_prefix: "->",
    priority_header: "->> Prioridades:",
    bullet: "-",
    terminator: ";",
    indent: "\t",
};

pub const SETTINGS_FILE: &str = "settings.json";

pub struct DefaultCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub struct QuickTaskPreset {
    pub category_id: &'static str,
    pub texts: &'static [&'static str],
}

pub struct StorageKeys {
    pub daily: &'static str,
    pub weekly: &'static str,
    pub categories: &'static str,
    pub history: &'static str,
    pub mode: &'static str,
    pub collapsed: &'static str,
    pub clear_armed: &'static str,
}

pub struct Limits {
    pub history_entries: usize,
    pub clear_confirm_seconds: u64,
    pub recent_entries: usize,
}

pub struct ExportGlyphs {
    pub category_prefix: &'static str,
    pub priority_header: &'static str,
    pub bullet: &'static str,
    pub terminator: &'static str,
    pub indent: &'static str,
}
