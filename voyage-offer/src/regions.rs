//! Carrier sets per travel region, used to pick plausible airlines for a route.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Airline {
    pub carrier: &'static str,
    pub logo: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    France,
    Japan,
    Uk,
    Us,
    Germany,
    Netherlands,
    Uae,
    Qatar,
    Singapore,
}

const EASYJET: Airline = Airline {
    carrier: "easyJet",
    logo: "https://commons.wikimedia.org/wiki/Special:FilePath/EasyJet_logo.svg",
};

const QATAR_AIRWAYS: Airline = Airline {
    carrier: "Qatar Airways",
    logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Qatar_Airways_logo.svg",
};

const FRANCE: [Airline; 3] = [
    Airline {
        carrier: "Air France",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Air%20France%20Logo.svg",
    },
    Airline {
        carrier: "Transavia",
        logo: "https://upload.wikimedia.org/wikipedia/commons/thumb/2/2f/Transavia_logo.svg/1280px-Transavia_logo.svg.png",
    },
    EASYJET,
];

const JAPAN: [Airline; 3] = [
    Airline {
        carrier: "All Nippon Airways",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/All_Nippon_Airways_Logo.svg",
    },
    Airline {
        carrier: "Japan Airlines",
        logo: "https://en.wikipedia.org/wiki/Special:FilePath/Japan_Airlines_logo_2011.svg",
    },
    Airline {
        carrier: "Peach Aviation",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Peach_Aviation_Logo.svg",
    },
];

const UK: [Airline; 3] = [
    Airline {
        carrier: "British Airways",
        logo: "https://en.wikipedia.org/wiki/Special:FilePath/British_Airways_Logo.svg",
    },
    Airline {
        carrier: "Virgin Atlantic",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Virgin_Atlantic_logo_2018.svg",
    },
    EASYJET,
];

const US: [Airline; 3] = [
    Airline {
        carrier: "Delta Air Lines",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Delta_logo.svg",
    },
    Airline {
        carrier: "United Airlines",
        logo: "https://en.wikipedia.org/wiki/Special:FilePath/United_Airlines_Logo.svg",
    },
    Airline {
        carrier: "American Airlines",
        logo: "https://en.wikipedia.org/wiki/Special:FilePath/American_Airlines_wordmark_(2013).svg",
    },
];

const GERMANY: [Airline; 3] = [
    Airline {
        carrier: "Lufthansa",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Lufthansa_Logo_2018.svg",
    },
    Airline {
        carrier: "Eurowings",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Eurowings_Logo.svg",
    },
    Airline {
        carrier: "Condor",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Condor_logo_2022.svg",
    },
];

const NETHERLANDS: [Airline; 3] = [
    Airline {
        carrier: "KLM",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/KLM_logo.svg",
    },
    Airline {
        carrier: "Transavia",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Transavia_logo.svg",
    },
    EASYJET,
];

const UAE: [Airline; 3] = [
    Airline {
        carrier: "Emirates",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Emirates_logo.svg",
    },
    Airline {
        carrier: "Etihad Airways",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Etihad-airways-logo.svg",
    },
    Airline {
        carrier: "flydubai",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Fly_Dubai_logo_2010_03.svg",
    },
];

const QATAR: [Airline; 3] = [QATAR_AIRWAYS, QATAR_AIRWAYS, QATAR_AIRWAYS];

const SINGAPORE: [Airline; 3] = [
    Airline {
        carrier: "Singapore Airlines",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Singapore_Airlines_Logo.svg",
    },
    Airline {
        carrier: "Scoot",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Scoot_logo.svg",
    },
    Airline {
        carrier: "Jetstar Asia",
        logo: "https://commons.wikimedia.org/wiki/Special:FilePath/Jetstar_logo.svg",
    },
];

// Checked in order; the first region with a matching substring wins.
const KEYWORDS: [(Region, &[&str]); 9] = [
    (Region::France, &["france", "paris"]),
    (Region::Japan, &["japan", "tokyo", "osaka", "kyoto"]),
    (Region::Uk, &["uk", "london", "britain", "england"]),
    (
        Region::Us,
        &[
            "usa",
            "united states",
            "us",
            "new york",
            "san francisco",
            "los angeles",
            "miami",
            "chicago",
            "boston",
            "seattle",
        ],
    ),
    (Region::Germany, &["germany", "berlin", "munich", "frankfurt", "hamburg"]),
    (Region::Netherlands, &["netherlands", "amsterdam"]),
    (Region::Uae, &["uae", "dubai", "abu dhabi"]),
    (Region::Qatar, &["qatar", "doha"]),
    (Region::Singapore, &["singapore"]),
];

const CARRIER_CODES: [(&str, &str); 21] = [
    ("Air France", "AF"),
    ("Transavia", "HV"),
    ("easyJet", "U2"),
    ("All Nippon Airways", "NH"),
    ("Japan Airlines", "JL"),
    ("Peach Aviation", "MM"),
    ("British Airways", "BA"),
    ("Virgin Atlantic", "VS"),
    ("Delta Air Lines", "DL"),
    ("United Airlines", "UA"),
    ("American Airlines", "AA"),
    ("Lufthansa", "LH"),
    ("Eurowings", "EW"),
    ("Condor", "DE"),
    ("KLM", "KL"),
    ("Emirates", "EK"),
    ("Etihad Airways", "EY"),
    ("flydubai", "FZ"),
    ("Qatar Airways", "QR"),
    ("Scoot", "TR"),
    ("Jetstar Asia", "3K"),
];

impl Region {
    /// Region named (by substring) in free-form place text.
    pub fn detect(text: &str) -> Option<Region> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(region, _)| *region)
    }

    pub fn airlines(self) -> &'static [Airline] {
        match self {
            Region::France => &FRANCE,
            Region::Japan => &JAPAN,
            Region::Uk => &UK,
            Region::Us => &US,
            Region::Germany => &GERMANY,
            Region::Netherlands => &NETHERLANDS,
            Region::Uae => &UAE,
            Region::Qatar => &QATAR,
            Region::Singapore => &SINGAPORE,
        }
    }
}

/// IATA designator for known carriers, otherwise the first two letters of the name.
pub fn carrier_code(carrier: &str) -> String {
    if let Some((_, code)) = CARRIER_CODES.iter().find(|(name, _)| *name == carrier) {
        return code.to_string();
    }
    carrier
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_region() {
        assert_eq!(Region::detect("Paris, France"), Some(Region::France));
        assert_eq!(Region::detect("KYOTO"), Some(Region::Japan));
        assert_eq!(Region::detect("Abu Dhabi"), Some(Region::Uae));
        assert_eq!(Region::detect("Lima"), None);
    }

    #[test]
    fn test_carrier_codes() {
        assert_eq!(carrier_code("All Nippon Airways"), "NH");
        assert_eq!(carrier_code("Jetstar Asia"), "3K");
        assert_eq!(carrier_code("Norse Atlantic"), "NO");
    }
}
