//! Prompt texts per content type and language
//!
//! Fault and manual generation run through the same generator and only differ
//! in the texts below.

use crate::models::{ContentType, GenerationContext, Language};

/// Prompt templates for one (content type, language) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTypeProfile {
    pub content_type: ContentType,
    pub language: Language,
}

impl ContentTypeProfile {
    pub fn new(content_type: ContentType, language: Language) -> Self {
        Self { content_type, language }
    }

    /// System message of the question-generation call
    pub fn question_system_prompt(&self) -> &'static str {
        match self.language {
            Language::En => {
                "You are an automotive SEO researcher. You know which questions car owners type \
                 into search engines. Reply with one question per line and nothing else."
            },
            Language::De => {
                "Du bist ein Automobil-SEO-Rechercheur. Du weißt, welche Fragen Autofahrer in \
                 Suchmaschinen eingeben. Antworte mit genau einer Frage pro Zeile und sonst nichts."
            },
        }
    }

    /// What the questions should be about
    pub fn topic_guidance(&self) -> &'static str {
        match (self.content_type, self.language) {
            (ContentType::Fault, Language::En) => {
                "faults and malfunctions: symptoms, warning lights, OBD error codes, strange \
                 noises, starting problems, breakdowns and their likely causes"
            },
            (ContentType::Fault, Language::De) => {
                "Fehler und Störungen: Symptome, Warnleuchten, OBD-Fehlercodes, ungewöhnliche \
                 Geräusche, Startprobleme, Pannen und deren wahrscheinliche Ursachen"
            },
            (ContentType::Manual, Language::En) => {
                "maintenance and repair procedures: service intervals, fluid changes, part \
                 replacement, resetting service indicators, tools and torque specifications"
            },
            (ContentType::Manual, Language::De) => {
                "Wartungs- und Reparaturanleitungen: Serviceintervalle, Flüssigkeitswechsel, \
                 Teiletausch, Zurücksetzen der Serviceanzeige, Werkzeuge und Anzugsdrehmomente"
            },
        }
    }

    /// User message asking for `count` new questions about one vehicle.
    ///
    /// `avoid` lists already accepted questions the model should not repeat.
    pub fn question_prompt(&self, vehicle: &GenerationContext, count: u32, avoid: &[&str]) -> String {
        let identity = vehicle.identity();
        let guidance = self.topic_guidance();

        let mut prompt = match self.language {
            Language::En => format!(
                "Vehicle: {identity}\n\
                 Write exactly {count} different questions that owners of this vehicle most often \
                 search for online about {guidance}.\n\
                 Write the questions in English, in natural search phrasing, and make each one \
                 specific to this vehicle.\n\
                 Output one question per line, without numbering, bullets or extra text."
            ),
            Language::De => format!(
                "Fahrzeug: {identity}\n\
                 Schreibe genau {count} verschiedene Fragen, die Besitzer dieses Fahrzeugs am \
                 häufigsten im Internet suchen, zum Thema {guidance}.\n\
                 Schreibe die Fragen auf Deutsch, so wie sie in eine Suchmaschine eingegeben \
                 werden, und beziehe jede Frage konkret auf dieses Fahrzeug.\n\
                 Gib eine Frage pro Zeile aus, ohne Nummerierung, Aufzählungszeichen oder \
                 zusätzlichen Text."
            ),
        };

        if !avoid.is_empty() {
            prompt.push_str(match self.language {
                Language::En => "\n\nDo not repeat any of these existing questions:\n",
                Language::De => "\n\nWiederhole keine dieser bereits vorhandenen Fragen:\n",
            });
            for question in avoid {
                prompt.push_str("- ");
                prompt.push_str(question);
                prompt.push('\n');
            }
        }

        prompt
    }

    /// System message of every answer-request record
    pub fn answer_system_prompt(&self) -> &'static str {
        match (self.content_type, self.language) {
            (ContentType::Fault, Language::En) => {
                "You are an experienced automotive diagnostic technician. Answer the owner's \
                 question about a fault on their vehicle: explain the most likely causes, how to \
                 diagnose them, which error codes may be stored, whether it is safe to keep \
                 driving and what a repair typically involves. Be precise and practical."
            },
            (ContentType::Fault, Language::De) => {
                "Du bist ein erfahrener Kfz-Diagnosetechniker. Beantworte die Frage des Besitzers \
                 zu einem Fehler an seinem Fahrzeug: Erkläre die wahrscheinlichsten Ursachen, wie \
                 man sie diagnostiziert, welche Fehlercodes gespeichert sein können, ob eine \
                 Weiterfahrt sicher ist und was eine Reparatur üblicherweise umfasst. Antworte \
                 präzise und praxisnah."
            },
            (ContentType::Manual, Language::En) => {
                "You are an experienced automotive service technician. Answer the owner's \
                 question with a clear step-by-step maintenance or repair procedure for their \
                 vehicle, including required tools, parts, fluids and specifications, and safety \
                 notes where relevant."
            },
            (ContentType::Manual, Language::De) => {
                "Du bist ein erfahrener Kfz-Servicetechniker. Beantworte die Frage des Besitzers \
                 mit einer klaren Schritt-für-Schritt-Anleitung zur Wartung oder Reparatur seines \
                 Fahrzeugs, einschließlich benötigter Werkzeuge, Teile, Flüssigkeiten und \
                 Spezifikationen sowie Sicherheitshinweisen, wo sinnvoll."
            },
        }
    }

    /// User turn of an answer-request record: the question plus the vehicle
    pub fn answer_user_turn(&self, question: &str, vehicle: &GenerationContext) -> String {
        let label = match self.language {
            Language::En => "Vehicle",
            Language::De => "Fahrzeug",
        };
        format!("{}\n\n{}: {}", question, label, vehicle.identity())
    }
}
