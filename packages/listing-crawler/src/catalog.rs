//! Default locations and weighted role titles.
//!
//! Weights express relative demand: 3 for roles we want well covered,
//! 1 for the common case, 0.3 for niche roles.

use crate::types::{Location, Role};

pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Sydney", "Sydney, New South Wales, Australia", "Australia"),
        Location::new("Melbourne", "Melbourne, Victoria, Australia", "Australia"),
        Location::new("Brisbane", "Brisbane, Queensland, Australia", "Australia"),
    ]
}

pub fn default_roles() -> Vec<Role> {
    ROLE_WEIGHTS
        .iter()
        .map(|(title, weight)| Role::new(*title, *weight))
        .collect()
}

const ROLE_WEIGHTS: &[(&str, f64)] = &[
    // General
    ("Software Engineer", 3.0),
    ("Data Analyst", 3.0),
    ("Project Manager", 1.0),
    ("Registered Nurse", 3.0),
    ("Accountant", 1.0),
    ("Marketing Manager", 1.0),
    ("Civil Engineer", 1.0),
    ("Teacher", 1.0),
    ("Sales Manager", 1.0),
    ("Graphic Designer", 1.0),
    ("Human Resources Manager", 1.0),
    ("Electrician", 1.0),
    ("Financial Analyst", 1.0),
    ("Chef", 1.0),
    ("Logistics Coordinator", 1.0),
    ("Customer Service Representative", 1.0),
    ("Business Development Manager", 1.0),
    ("Occupational Therapist", 0.3),
    ("Retail Manager", 1.0),
    ("Mechanical Engineer", 1.0),
    // Technology
    ("Frontend Developer", 3.0),
    ("Backend Developer", 3.0),
    ("DevOps Engineer", 3.0),
    ("Data Scientist", 3.0),
    ("Machine Learning Engineer", 1.0),
    ("Cloud Architect", 1.0),
    ("Cybersecurity Analyst", 1.0),
    ("IT Support Specialist", 1.0),
    ("Database Administrator", 1.0),
    ("Systems Analyst", 1.0),
    ("Network Engineer", 1.0),
    ("UX Designer", 1.0),
    ("UI Designer", 1.0),
    ("Technical Writer", 0.3),
    ("Product Manager", 1.0),
    // Health
    ("General Practitioner", 1.0),
    ("Pharmacist", 1.0),
    ("Physiotherapist", 1.0),
    ("Dentist", 0.3),
    ("Medical Laboratory Technician", 0.3),
    ("Midwife", 0.3),
    ("Radiographer", 0.3),
    ("Paramedic", 1.0),
    ("Clinical Psychologist", 0.3),
    ("Aged Care Worker", 1.0),
    // Finance and business
    ("Financial Planner", 1.0),
    ("Tax Consultant", 1.0),
    ("Investment Analyst", 1.0),
    ("Risk Manager", 1.0),
    ("Management Consultant", 1.0),
    ("Business Analyst", 3.0),
    ("Procurement Manager", 1.0),
    ("Auditor", 1.0),
    ("Credit Analyst", 1.0),
    ("Payroll Officer", 1.0),
    // Construction and trades
    ("Structural Engineer", 1.0),
    ("Electrical Engineer", 1.0),
    ("Environmental Engineer", 0.3),
    ("Quantity Surveyor", 1.0),
    ("Construction Manager", 1.0),
    ("Plumber", 1.0),
    ("Carpenter", 1.0),
    ("Welder", 1.0),
    ("Site Supervisor", 1.0),
    ("Building Inspector", 0.3),
    // Education
    ("University Lecturer", 0.3),
    ("Early Childhood Educator", 1.0),
    ("Special Education Teacher", 0.3),
    ("Vocational Trainer", 0.3),
    ("Librarian", 0.3),
    ("Education Consultant", 0.3),
    ("School Counselor", 0.3),
    ("Academic Researcher", 0.3),
    // Hospitality and tourism
    ("Barista", 1.0),
    ("Hotel Manager", 1.0),
    ("Travel Agent", 0.3),
    ("Event Coordinator", 1.0),
    ("Sous Chef", 1.0),
    ("Restaurant Manager", 1.0),
    ("Tour Guide", 0.3),
    ("Bartender", 1.0),
    // Sales and retail
    ("Sales Representative", 1.0),
    ("Store Assistant", 1.0),
    ("Merchandiser", 1.0),
    ("E-commerce Specialist", 1.0),
    ("Real Estate Agent", 1.0),
    ("Account Manager", 1.0),
    ("Customer Success Manager", 1.0),
    // Legal and policy
    ("Lawyer", 1.0),
    ("Paralegal", 1.0),
    ("Compliance Officer", 1.0),
    ("Legal Secretary", 1.0),
    ("Policy Analyst", 0.3),
    // Media and creative
    ("Content Creator", 1.0),
    ("Video Editor", 0.3),
    ("Journalist", 0.3),
    ("Public Relations Specialist", 1.0),
    ("Photographer", 0.3),
    ("Copywriter", 1.0),
    ("Art Director", 0.3),
    // Manufacturing and logistics
    ("Production Manager", 1.0),
    ("Warehouse Manager", 1.0),
    ("Supply Chain Analyst", 1.0),
    ("Forklift Operator", 1.0),
    ("Quality Assurance Inspector", 1.0),
    ("Maintenance Technician", 1.0),
    ("Factory Worker", 1.0),
    // Environment and agriculture
    ("Environmental Scientist", 0.3),
    ("Agricultural Consultant", 0.3),
    ("Horticulturist", 0.3),
    ("Park Ranger", 0.3),
    ("Sustainability Consultant", 0.3),
    // Public sector
    ("Public Servant", 1.0),
    ("Urban Planner", 0.3),
    ("Social Worker", 1.0),
    ("Community Development Officer", 0.3),
    ("Emergency Services Officer", 0.3),
    // Arts
    ("Actor", 0.3),
    ("Musician", 0.3),
    ("Stage Manager", 0.3),
];
