//! Versioned reference data
//!
//! The national average screen-time curve, per-dimension descriptors, shock
//! phrase templates and the recommendation catalog. The engine receives this
//! as injected data so the tables can be revised without touching scoring code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ImpactError;
use crate::types::{Dimension, ImpactLabel};

/// Version tag of the built-in catalog
pub const BUILTIN_REFERENCE_VERSION: &str = "fr-2024.1";

/// Placeholder for the dimension's noun phrase in shock templates
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Placeholder for the dimension score in shock templates
pub const SCORE_PLACEHOLDER: &str = "{score}";

/// National average daily screen time at one age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageHours {
    pub age: u8,
    pub hours: f64,
}

/// Loadable tables consumed by the scorers, aggregator, projector and selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub version: String,
    /// Sorted by age; values between entries are interpolated
    pub average_hours_by_age: Vec<AverageHours>,
    pub descriptors: BTreeMap<Dimension, BTreeMap<ImpactLabel, String>>,
    pub shock_templates: BTreeMap<ImpactLabel, String>,
    /// Candidates per dimension and label, best first
    pub recommendations: BTreeMap<Dimension, BTreeMap<ImpactLabel, Vec<String>>>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceData {
    /// Load reference data from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ImpactError> {
        let data: ReferenceData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// National average hours per day at `age`
    ///
    /// Linear interpolation between table entries; ages outside the table
    /// take the nearest end value.
    pub fn average_hours_at(&self, age: u8) -> f64 {
        let table = &self.average_hours_by_age;
        let (first, last) = match (table.first(), table.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if age <= first.age {
            return first.hours;
        }
        if age >= last.age {
            return last.hours;
        }

        for pair in table.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if age == lo.age {
                return lo.hours;
            }
            if age == hi.age {
                return hi.hours;
            }
            if age > lo.age && age < hi.age {
                let span = (hi.age - lo.age) as f64;
                let t = (age - lo.age) as f64 / span;
                return lo.hours + t * (hi.hours - lo.hours);
            }
        }

        last.hours
    }

    pub fn descriptor(&self, dimension: Dimension, label: ImpactLabel) -> &str {
        self.descriptors
            .get(&dimension)
            .and_then(|by_label| by_label.get(&label))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn shock_template(&self, label: ImpactLabel) -> &str {
        self.shock_templates
            .get(&label)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn recommendation_pool(&self, dimension: Dimension, label: ImpactLabel) -> &[String] {
        self.recommendations
            .get(&dimension)
            .and_then(|by_label| by_label.get(&label))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check that every lookup the engine performs will find an entry
    pub fn validate(&self) -> Result<(), ImpactError> {
        if self.average_hours_by_age.is_empty() {
            return Err(invalid("average curve is empty"));
        }
        for pair in self.average_hours_by_age.windows(2) {
            if pair[1].age <= pair[0].age {
                return Err(invalid(format!(
                    "average curve ages must be strictly increasing (found {} after {})",
                    pair[1].age, pair[0].age
                )));
            }
        }
        if let Some(point) = self
            .average_hours_by_age
            .iter()
            .find(|p| !p.hours.is_finite() || p.hours < 0.0)
        {
            return Err(invalid(format!(
                "average hours at age {} must be a non-negative number",
                point.age
            )));
        }

        for label in ImpactLabel::ALL {
            let template = self.shock_template(label);
            if !template.contains(SUBJECT_PLACEHOLDER) {
                return Err(invalid(format!(
                    "shock template for {} must contain {SUBJECT_PLACEHOLDER}",
                    label.as_str()
                )));
            }
        }

        for dimension in Dimension::PRIORITY {
            for label in ImpactLabel::ALL {
                if self.descriptor(dimension, label).is_empty() {
                    return Err(invalid(format!(
                        "missing descriptor for {}/{}",
                        dimension.as_str(),
                        label.as_str()
                    )));
                }
                let pool = self.recommendation_pool(dimension, label);
                if pool.is_empty() {
                    return Err(invalid(format!(
                        "empty recommendation pool for {}/{}",
                        dimension.as_str(),
                        label.as_str()
                    )));
                }
                if pool.iter().any(|text| text.trim().is_empty()) {
                    return Err(invalid(format!(
                        "blank recommendation in {}/{}",
                        dimension.as_str(),
                        label.as_str()
                    )));
                }
            }
        }

        Ok(())
    }

    /// The catalog shipped with the engine
    pub fn builtin() -> Self {
        let average_hours_by_age = [
            (3, 1.2),
            (5, 1.6),
            (7, 2.0),
            (9, 2.6),
            (11, 3.3),
            (13, 4.2),
            (15, 4.8),
            (17, 5.2),
        ]
        .into_iter()
        .map(|(age, hours)| AverageHours { age, hours })
        .collect();

        let mut descriptors = BTreeMap::new();
        descriptors.insert(
            Dimension::Sleep,
            labelled(
                "Sommeil préservé : les écrans ne semblent pas perturber le repos",
                "Sommeil fragilisé : endormissement parfois retardé par les écrans",
                "Sommeil perturbé : difficulté d'endormissement, repos de mauvaise qualité",
                "Sommeil fortement perturbé : les écrans empiètent nettement sur le repos",
            ),
        );
        descriptors.insert(
            Dimension::Physical,
            labelled(
                "Santé physique préservée : activité physique suffisante",
                "Sédentarité à surveiller : le temps assis devant les écrans s'installe",
                "Santé physique fragilisée : sédentarité, surpoids, fatigue visuelle",
                "Santé physique très fragilisée : sédentarité marquée et fatigue visuelle",
            ),
        );
        descriptors.insert(
            Dimension::Attention,
            labelled(
                "Attention préservée : capacité à se concentrer sur la durée",
                "Concentration parfois difficile après les écrans",
                "Attention et concentration réduites : moins de patience, difficulté à se focaliser",
                "Attention fortement réduite : difficulté durable à se focaliser",
            ),
        );
        descriptors.insert(
            Dimension::Academic,
            labelled(
                "Apprentissages préservés",
                "Apprentissages à surveiller : devoirs concurrencés par les écrans",
                "Résultats scolaires en baisse : apprentissages freinés, mémorisation altérée",
                "Résultats scolaires nettement affectés : retard d'apprentissage installé",
            ),
        );
        descriptors.insert(
            Dimension::Family,
            labelled(
                "Lien familial préservé : des moments partagés réguliers",
                "Moments partagés en recul au profit des écrans",
                "Lien familial affaibli : moins d'échanges, tensions, complicité réduite",
                "Lien familial fortement affaibli : les écrans remplacent les échanges",
            ),
        );
        descriptors.insert(
            Dimension::Social,
            labelled(
                "Relations sociales préservées",
                "Relations sociales à surveiller : comparaison en ligne naissante",
                "Relations sociales et estime de soi affectées : isolement, comparaison, anxiété",
                "Isolement marqué et estime de soi fragilisée",
            ),
        );

        let shock_templates = labelled(
            "Bonne nouvelle : même {subject}, le domaine le plus exposé, reste préservé ({score}/100).",
            "Attention : les écrans commencent à peser sur {subject} de votre enfant ({score}/100).",
            "Les écrans pèsent déjà lourdement sur {subject} de votre enfant ({score}/100).",
            "Alerte : les écrans affectent sévèrement {subject} de votre enfant ({score}/100).",
        );

        Self {
            version: BUILTIN_REFERENCE_VERSION.to_string(),
            average_hours_by_age,
            descriptors,
            shock_templates,
            recommendations: builtin_recommendations(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ImpactError {
    ImpactError::InvalidReference(message.into())
}

fn labelled<T: Into<String>>(low: T, moderate: T, high: T, severe: T) -> BTreeMap<ImpactLabel, String> {
    BTreeMap::from([
        (ImpactLabel::Low, low.into()),
        (ImpactLabel::Moderate, moderate.into()),
        (ImpactLabel::High, high.into()),
        (ImpactLabel::Severe, severe.into()),
    ])
}

fn pools(
    low: &[&str],
    moderate: &[&str],
    high: &[&str],
    severe: &[&str],
) -> BTreeMap<ImpactLabel, Vec<String>> {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (ImpactLabel::Low, owned(low)),
        (ImpactLabel::Moderate, owned(moderate)),
        (ImpactLabel::High, owned(high)),
        (ImpactLabel::Severe, owned(severe)),
    ])
}

// Several entries are shared between dimensions on purpose; the selector
// substitutes the next candidate when one is already taken.
const SCREENS_OFF_BEFORE_BED: &str = "Couper les écrans une heure avant le coucher";
const SCREEN_FREE_MEALS: &str = "Instaurer des repas sans écran en famille";
const SHORT_HOMEWORK_SESSIONS: &str =
    "Fractionner les devoirs en séances courtes sans téléphone à portée";
const TALK_TO_SCHOOL_STAFF: &str =
    "Parler des difficultés de concentration avec l'enseignant ou un professionnel";

fn builtin_recommendations() -> BTreeMap<Dimension, BTreeMap<ImpactLabel, Vec<String>>> {
    let mut catalog = BTreeMap::new();

    catalog.insert(
        Dimension::Sleep,
        pools(
            &[
                "Conserver des horaires de coucher réguliers, même le week-end",
                "Garder la chambre comme un espace sans écran",
            ],
            &[
                SCREENS_OFF_BEFORE_BED,
                "Remplacer l'écran du soir par un moment de lecture partagé",
                "Garder la chambre comme un espace sans écran",
            ],
            &[
                SCREENS_OFF_BEFORE_BED,
                "Installer une station de recharge hors de la chambre",
                "Remplacer l'écran du soir par un moment de lecture partagé",
            ],
            &[
                SCREENS_OFF_BEFORE_BED,
                "Installer une station de recharge hors de la chambre",
                "Consulter un professionnel de santé si les troubles du sommeil persistent",
            ],
        ),
    );

    catalog.insert(
        Dimension::Attention,
        pools(
            &[
                "Proposer des jeux de société qui entraînent la patience",
                "Encourager les activités créatives sans écran",
            ],
            &[
                "Limiter les vidéos courtes et le défilement infini",
                "Proposer des jeux de société qui entraînent la patience",
                SCREENS_OFF_BEFORE_BED,
            ],
            &[
                SCREENS_OFF_BEFORE_BED,
                "Limiter les vidéos courtes et le défilement infini",
                SHORT_HOMEWORK_SESSIONS,
            ],
            &[
                SCREENS_OFF_BEFORE_BED,
                "Limiter les vidéos courtes et le défilement infini",
                TALK_TO_SCHOOL_STAFF,
            ],
        ),
    );

    catalog.insert(
        Dimension::Physical,
        pools(
            &[
                "Maintenir au moins une heure d'activité physique par jour",
                "Privilégier les trajets à pied ou à vélo",
            ],
            &[
                "Privilégier les trajets à pied ou à vélo",
                "Instaurer une pause active toutes les 30 minutes d'écran",
                "Maintenir au moins une heure d'activité physique par jour",
            ],
            &[
                "Inscrire votre enfant à une activité sportive qui lui plaît",
                "Instaurer une pause active toutes les 30 minutes d'écran",
                "Privilégier les trajets à pied ou à vélo",
            ],
            &[
                "Inscrire votre enfant à une activité sportive qui lui plaît",
                "Prévoir une sortie en plein air chaque jour",
                "Instaurer une pause active toutes les 30 minutes d'écran",
            ],
        ),
    );

    catalog.insert(
        Dimension::Academic,
        pools(
            &[
                "Valoriser les efforts scolaires plutôt que les notes",
                "Garder un coin devoirs calme et sans écran",
            ],
            &[
                "Garder un coin devoirs calme et sans écran",
                "Faire les devoirs avant tout temps d'écran de loisir",
                "Valoriser les efforts scolaires plutôt que les notes",
            ],
            &[
                "Faire les devoirs avant tout temps d'écran de loisir",
                SHORT_HOMEWORK_SESSIONS,
                "Garder un coin devoirs calme et sans écran",
            ],
            &[
                "Faire les devoirs avant tout temps d'écran de loisir",
                SHORT_HOMEWORK_SESSIONS,
                TALK_TO_SCHOOL_STAFF,
            ],
        ),
    );

    catalog.insert(
        Dimension::Family,
        pools(
            &[
                "Continuer à partager des activités en famille chaque semaine",
                SCREEN_FREE_MEALS,
            ],
            &[
                SCREEN_FREE_MEALS,
                "Planifier une sortie familiale sans écran chaque week-end",
                "Continuer à partager des activités en famille chaque semaine",
            ],
            &[
                SCREEN_FREE_MEALS,
                "Planifier une sortie familiale sans écran chaque week-end",
                "Définir ensemble des règles d'usage des écrans",
            ],
            &[
                "Définir ensemble des règles d'usage des écrans",
                SCREEN_FREE_MEALS,
                "Planifier une sortie familiale sans écran chaque week-end",
            ],
        ),
    );

    catalog.insert(
        Dimension::Social,
        pools(
            &[
                "Encourager les rencontres avec les amis en dehors des écrans",
                "Échanger régulièrement sur ce que votre enfant voit en ligne",
            ],
            &[
                "Échanger régulièrement sur ce que votre enfant voit en ligne",
                "Encourager les rencontres avec les amis en dehors des écrans",
                SCREEN_FREE_MEALS,
            ],
            &[
                "Encourager une activité de groupe (club, association, sport collectif)",
                "Échanger régulièrement sur ce que votre enfant voit en ligne",
                "Limiter les réseaux sociaux aux créneaux convenus ensemble",
            ],
            &[
                "Limiter les réseaux sociaux aux créneaux convenus ensemble",
                "Encourager une activité de groupe (club, association, sport collectif)",
                "Être attentif aux signes d'isolement et en parler avec un professionnel",
            ],
        ),
    );

    catalog
}
